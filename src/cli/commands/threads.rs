//! Threads command implementation.

use crate::cli::{Output, ThreadsAction};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::store::Role;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the threads command.
pub async fn run_threads(action: &ThreadsAction, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match action {
        ThreadsAction::List => {
            let threads = orchestrator.list_threads()?;
            if threads.is_empty() {
                Output::info("No conversations yet. Start one with 'tubetalk chat --url <URL>'.");
                return Ok(());
            }

            Output::header(&format!("Threads ({})", threads.len()));
            println!();
            for thread in &threads {
                Output::thread_info(
                    &thread.thread_id,
                    thread.video_url.as_deref(),
                    thread.message_count,
                    &thread.created_at.format("%Y-%m-%d %H:%M").to_string(),
                );
            }
            println!();
            Output::kv("Indexed chunks", &orchestrator.indexed_chunk_count().await?.to_string());
        }

        ThreadsAction::Show { thread } => {
            let (info, messages) = match orchestrator.thread_history(thread).await {
                Ok(found) => found,
                Err(e) => {
                    Output::warning(&e.to_string());
                    return Err(e.into());
                }
            };

            Output::header(&format!("Thread {}", info.thread_id));
            if let Some(url) = &info.video_url {
                Output::kv("Video", url);
            }
            Output::kv("Messages", &messages.len().to_string());
            println!();

            for message in &messages {
                let label = match message.role {
                    Role::User => style("You:").green().bold(),
                    Role::Assistant => style("TubeTalk:").cyan().bold(),
                };
                println!("{} {}\n", label, message.render());
            }
        }

        ThreadsAction::DeleteAll { yes } => {
            if !*yes && !confirm("Delete ALL threads, messages and study material?")? {
                Output::info("Cancelled.");
                return Ok(());
            }

            let (threads, embeddings) = orchestrator.delete_all_threads().await?;
            Output::success(&format!(
                "Deleted {} threads and {} indexed chunks.",
                threads, embeddings
            ));
        }
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
