//! TubeTalk - Learn from YouTube lectures
//!
//! A CLI and HTTP service that turns a lecture video's captions into study material.
//!
//! # Overview
//!
//! TubeTalk allows you to:
//! - Fetch the timestamped transcript of a YouTube video
//! - Generate a summary, a topic outline and a multiple-choice quiz
//! - Chat with a video, with answers pointing at the moment they come from
//! - Keep named conversation threads in a local SQLite database
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Video id parsing and caption fetching
//! - `chunking` - Overlapping windows over transcript segments
//! - `embedding` - Embedding generation
//! - `vector_store` - Per-thread chunk indexes
//! - `llm` - Chat model abstraction and JSON reply parsing
//! - `rag` - Retrieval and timestamped answers
//! - `study` - Summary, topic outline and quiz generation
//! - `store` - Threads, messages and cached study material
//! - `chat` - Conversation sessions
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use tubetalk::config::Settings;
//! use tubetalk::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let quiz = orchestrator
//!         .quiz("https://www.youtube.com/watch?v=dQw4w9WgXcQ", None, false)
//!         .await?;
//!     println!("Generated {} questions", quiz.value.len());
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod store;
pub mod study;
pub mod transcript;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{Result, TubetalkError};
