//! Transcript chunking for retrieval.
//!
//! Splits the flattened transcript into fixed-size, overlapping character windows.

mod window;

pub use window::{split_text, TextWindow, WindowChunker};

use serde::{Deserialize, Serialize};

/// A chunk of transcript text ready for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Start time of the first caption touched by this chunk.
    pub start_seconds: f64,
    /// End time of the last caption touched by this chunk.
    pub end_seconds: f64,
    /// Order of this chunk in the transcript.
    pub order: i32,
    /// Character offset of the chunk in the flattened transcript.
    pub char_start: usize,
    /// Exclusive end offset.
    pub char_end: usize,
}

impl ContentChunk {
    /// Format timestamp for display.
    pub fn format_timestamp(&self) -> String {
        crate::transcript::format_timestamp(self.start_seconds)
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

impl ChunkingConfig {
    /// Distance between the starts of consecutive windows.
    pub fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }

    /// Number of windows produced for a text of `len` characters.
    pub fn expected_chunks(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else if len <= self.chunk_size {
            1
        } else {
            (len - self.chunk_overlap).div_ceil(self.stride())
        }
    }
}
