//! Summary command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

pub async fn run_summary(
    url: &str,
    thread: Option<&str>,
    regenerate: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Generate)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Summarizing video...");
    let result = orchestrator.summary(url, thread, regenerate).await;
    spinner.finish_and_clear();

    let generated = result?;
    if generated.cached {
        Output::success("Summary loaded from store.");
    }

    Output::header("Video Summary");
    println!("{}", generated.value.format_for_display());
    Ok(())
}
