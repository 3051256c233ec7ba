//! Interactive chat command.

use crate::chat::ChatSession;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::TubetalkError;
use crate::orchestrator::Orchestrator;
use crate::store::Role;
use crate::transcript::watch_url_at;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(url: Option<String>, thread: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = ChatSession::new(&orchestrator);

    let opened = match (url, thread) {
        (Some(url), thread) => {
            let thread = thread.unwrap_or_else(ChatSession::generate_thread_id);
            let spinner = Output::spinner("Fetching transcript and building index...");
            let result = session.start(&url, &thread).await;
            spinner.finish_and_clear();
            result
        }
        (None, Some(thread)) => session.resume(&thread).await,
        (None, None) => Err(TubetalkError::MissingInput(
            "give --url to start a conversation or --thread to resume one".to_string(),
        )),
    };

    if let Err(e) = opened {
        match &e {
            TubetalkError::MissingInput(_)
            | TubetalkError::ThreadExists(_)
            | TubetalkError::TranscriptFetch(_) => Output::warning(&e.to_string()),
            _ => Output::error(&e.to_string()),
        }
        return Err(e.into());
    }

    let thread_id = session.thread_id().unwrap_or_default().to_string();
    println!("\n{}", style("TubeTalk Chat").bold().cyan());
    Output::kv("Thread", &thread_id);
    if let Some(url) = session.video_url() {
        Output::kv("Video", url);
    }
    println!("{}\n", style("Ask about the video, or type 'exit' to quit.").dim());

    for message in session.history() {
        match message.role {
            Role::User => println!("{} {}", style("You:").green().bold(), message.content),
            Role::Assistant => Output::answer(
                &message.content,
                message.timestamp.unwrap_or_default(),
                None,
            ),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let result = session.ask(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                let link = session
                    .video_url()
                    .and_then(|u| watch_url_at(u, response.answer.timestamp));
                Output::answer(&response.answer.text(), response.answer.timestamp, link.as_deref());
            }
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    if let Some(hint) = resume_hint(&session) {
        Output::info(&hint);
    }
    Ok(())
}

/// Only threads with at least one answer are saved and can be resumed.
fn resume_hint(session: &ChatSession<'_>) -> Option<String> {
    if session.history().is_empty() {
        return None;
    }
    session
        .thread_id()
        .map(|thread| format!("Resume later with: tubetalk chat --thread {}", thread))
}
