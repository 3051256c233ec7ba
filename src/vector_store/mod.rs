//! Vector index abstraction for TubeTalk.
//!
//! Chunk embeddings are grouped by conversation thread. A fresh chat session
//! indexes into memory; the index is written to SQLite with the thread's first message.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::ContentChunk;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An embedded transcript chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Thread this chunk was indexed for.
    pub thread_id: String,
    /// Text content of this chunk.
    pub content: String,
    /// Start time in the video (seconds).
    pub start_seconds: f64,
    /// End time in the video (seconds).
    pub end_seconds: f64,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Order of this chunk in the transcript.
    pub chunk_order: i32,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Build a document from a chunk and its embedding.
    pub fn from_chunk(thread_id: &str, chunk: ContentChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            thread_id: thread_id.to_string(),
            content: chunk.content,
            start_seconds: chunk.start_seconds,
            end_seconds: chunk.end_seconds,
            embedding,
            chunk_order: chunk.order,
            indexed_at: Utc::now(),
        }
    }

    /// Format timestamp for display.
    pub fn format_timestamp(&self) -> String {
        crate::transcript::format_timestamp(self.start_seconds)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Top `limit` documents of a thread by cosine similarity. No score floor.
    async fn search(
        &self,
        thread_id: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(thread_id, query_embedding, limit, f32::MIN)
            .await
    }

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        thread_id: &str,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Get all documents of a thread in chunk order.
    async fn get_by_thread(&self, thread_id: &str) -> Result<Vec<Document>>;

    /// Delete every document.
    async fn delete_all(&self) -> Result<usize>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score, filter, sort descending and truncate.
pub(crate) fn rank<'a>(
    docs: impl Iterator<Item = &'a Document>,
    query_embedding: &[f32],
    limit: usize,
    min_score: f32,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = docs
        .map(|doc| SearchResult {
            score: cosine_similarity(query_embedding, &doc.embedding),
            document: doc.clone(),
        })
        .filter(|r| r.score >= min_score)
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.document.chunk_order.cmp(&b.document.chunk_order))
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_document_from_chunk() {
        let chunk = ContentChunk {
            content: "graphs (125.0)".to_string(),
            start_seconds: 125.0,
            end_seconds: 130.0,
            order: 4,
            char_start: 0,
            char_end: 14,
        };
        let doc = Document::from_chunk("t1", chunk, vec![0.5, 0.5]);

        assert_eq!(doc.thread_id, "t1");
        assert_eq!(doc.chunk_order, 4);
        assert_eq!(doc.format_timestamp(), "02:05");
    }
}
