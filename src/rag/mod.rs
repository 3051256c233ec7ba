//! Retrieval-augmented answering over one video's transcript.
//!
//! Every answer is a typed [`Answer`] carrying the video position it was taken from.

mod answer;
pub mod context;
mod response;

pub use answer::Answer;
pub use context::ContextBuilder;
pub use response::{RagEngine, RagResponse};

use crate::vector_store::SearchResult;

/// A retrieved transcript chunk.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Formatted timestamp (e.g., "02:34").
    pub timestamp: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Text content, with inline `(seconds)` markers.
    pub content: String,
    /// Similarity score.
    pub score: f32,
    /// Watch link at the chunk start (if the video URL is known).
    pub url: Option<String>,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            timestamp: result.document.format_timestamp(),
            start_seconds: result.document.start_seconds,
            content: result.document.content,
            score: result.score,
            url: None,
        }
    }
}
