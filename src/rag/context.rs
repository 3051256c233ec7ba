//! Context building for chat answers.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::transcript::watch_url_at;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::debug;

/// Retrieves the chunks of a thread's index closest to a question.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: Option<f32>,
}

impl ContextBuilder {
    /// Create a new context builder returning the 3 nearest chunks.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_chunks: 3,
            min_score: None,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Drop chunks scoring below `min_score`. `None` forwards the top chunks regardless.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Build context for a question asked in `thread_id`.
    pub async fn build(
        &self,
        thread_id: &str,
        query: &str,
        video_url: Option<&str>,
    ) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = match self.min_score {
            Some(min_score) => {
                self.vector_store
                    .search_with_threshold(thread_id, &query_embedding, self.max_chunks, min_score)
                    .await?
            }
            None => {
                self.vector_store
                    .search(thread_id, &query_embedding, self.max_chunks)
                    .await?
            }
        };

        debug!("Retrieved {} chunks for thread {}", results.len(), thread_id);

        Ok(results
            .into_iter()
            .map(|r| {
                let mut chunk = ContextChunk::from(r);
                chunk.url = video_url.and_then(|u| watch_url_at(u, chunk.start_seconds));
                chunk
            })
            .collect())
    }
}

/// Join chunk contents for the transcript system message.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
