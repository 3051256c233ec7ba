//! CLI module for TubeTalk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// TubeTalk - learn from YouTube lectures
///
/// Chat with a video, summarize it, outline its topics and quiz yourself on it.
/// Everything is stored locally per conversation thread.
#[derive(Parser, Debug)]
#[command(name = "tubetalk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with a video. Give --url to start a thread, or only --thread to resume one
    Chat {
        /// YouTube URL to start a new conversation about
        #[arg(short, long)]
        url: Option<String>,

        /// Conversation name (generated when starting without one)
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Summarize a video
    Summary {
        /// YouTube URL
        url: String,

        /// Thread to cache the summary under
        #[arg(short, long)]
        thread: Option<String>,

        /// Ignore the cached summary and generate a new one
        #[arg(long)]
        regenerate: bool,
    },

    /// Outline the main topics and subtopics of a video with timestamps
    Topics {
        /// YouTube URL
        url: String,

        /// Thread to cache the outline under
        #[arg(short, long)]
        thread: Option<String>,

        /// Ignore the cached outline and generate a new one
        #[arg(long)]
        regenerate: bool,
    },

    /// Generate a multiple-choice quiz for a video
    Quiz {
        /// YouTube URL
        url: String,

        /// Thread to cache the quiz under
        #[arg(short, long)]
        thread: Option<String>,

        /// Ignore the cached quiz and generate a new one
        #[arg(long)]
        regenerate: bool,

        /// Answer the questions in the terminal
        #[arg(short, long)]
        interactive: bool,
    },

    /// Print the transcript of a video
    Transcript {
        /// YouTube URL
        url: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = TranscriptFormat::Text)]
        format: TranscriptFormat,
    },

    /// Inspect or delete conversation threads
    Threads {
        #[command(subcommand)]
        action: ThreadsAction,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    /// Segments as JSON
    Json,
    /// One `[MM:SS] text` line per caption
    Text,
    /// Single line with `(seconds)` after each caption
    Flat,
}

#[derive(Subcommand, Debug)]
pub enum ThreadsAction {
    /// List all threads
    List,

    /// Show the messages of a thread
    Show {
        /// Thread name
        thread: String,
    },

    /// Delete every thread with its messages, index and study material
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
