//! TubeTalk CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubetalk::cli::{commands, Cli, Commands};
use tubetalk::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubetalk={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match cli.command {
        Commands::Chat { url, thread } => {
            commands::run_chat(url, thread, settings).await?;
        }

        Commands::Summary { url, thread, regenerate } => {
            commands::run_summary(&url, thread.as_deref(), regenerate, settings).await?;
        }

        Commands::Topics { url, thread, regenerate } => {
            commands::run_topics(&url, thread.as_deref(), regenerate, settings).await?;
        }

        Commands::Quiz { url, thread, regenerate, interactive } => {
            commands::run_quiz(&url, thread.as_deref(), regenerate, interactive, settings).await?;
        }

        Commands::Transcript { url, format } => {
            commands::run_transcript(&url, format, settings).await?;
        }

        Commands::Threads { action } => {
            commands::run_threads(&action, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
