//! Topics command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::transcript::embed_url_at;
use anyhow::Result;
use console::style;

pub async fn run_topics(
    url: &str,
    thread: Option<&str>,
    regenerate: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Generate)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Extracting topics...");
    let result = orchestrator.topics(url, thread, regenerate).await;
    spinner.finish_and_clear();

    let generated = result?;
    let outline = generated.value;

    if generated.cached {
        Output::success("Topics loaded from store.");
    } else if thread.is_some() {
        Output::success("Topics extracted and saved.");
    }

    if outline.main_topics.is_empty() {
        Output::warning("No topics found in this video.");
        return Ok(());
    }

    Output::header("Extracted Topics");
    println!("{}", outline.format_for_display());

    Output::header("Jump to");
    for (label, timestamp) in outline.entries() {
        println!("  {:>5}  {}", label, style(embed_url_at(url, timestamp)).dim());
    }

    Ok(())
}
