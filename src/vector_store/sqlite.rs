//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs; similarity is computed in Rust.

use super::{rank, Document, SearchResult, VectorStore};
use crate::error::{Result, TubetalkError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS embeddings (
        id TEXT PRIMARY KEY,
        thread_id TEXT NOT NULL,
        content TEXT NOT NULL,
        start_seconds REAL NOT NULL,
        end_seconds REAL NOT NULL,
        embedding BLOB NOT NULL,
        chunk_order INTEGER NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_embeddings_thread_id ON embeddings(thread_id);
"#;

const SELECT_COLUMNS: &str = "SELECT id, thread_id, content, start_seconds, end_seconds, \
     embedding, chunk_order, indexed_at FROM embeddings";

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) the store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubetalkError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(5)?;
        let indexed_at_str: String = row.get(7)?;

        Ok(Document {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            thread_id: row.get(1)?,
            content: row.get(2)?,
            start_seconds: row.get(3)?,
            end_seconds: row.get(4)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            chunk_order: row.get(6)?,
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn load_thread(conn: &Connection, thread_id: &str) -> Result<Vec<Document>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE thread_id = ?1 ORDER BY chunk_order",
            SELECT_COLUMNS
        ))?;
        let docs = stmt
            .query_map(params![thread_id], Self::row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO embeddings
                (id, thread_id, content, start_seconds, end_seconds, embedding, chunk_order, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    doc.id.to_string(),
                    doc.thread_id,
                    doc.content,
                    doc.start_seconds,
                    doc.end_seconds,
                    Self::embedding_to_bytes(&doc.embedding),
                    doc.chunk_order,
                    doc.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Saved {} embeddings", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        thread_id: &str,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let docs = Self::load_thread(&conn, thread_id)?;
        let results = rank(docs.iter(), query_embedding, limit, min_score);

        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn get_by_thread(&self, thread_id: &str) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        Self::load_thread(&conn, thread_id)
    }

    async fn delete_all(&self) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM embeddings", [])?;
        info!("Deleted all {} embeddings", deleted);
        Ok(deleted)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ContentChunk;

    fn doc(thread: &str, order: i32, embedding: Vec<f32>) -> Document {
        Document::from_chunk(
            thread,
            ContentChunk {
                content: format!("intro ({}.0)", order),
                start_seconds: order as f64,
                end_seconds: order as f64 + 1.0,
                order,
                char_start: 0,
                char_end: 11,
            },
            embedding,
        )
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[doc("t1", 1, vec![0.0, 1.0]), doc("t1", 0, vec![1.0, 0.0])])
            .await
            .unwrap();

        let docs = store.get_by_thread("t1").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].chunk_order, 0);
        assert_eq!(docs[0].embedding, vec![1.0, 0.0]);

        let results = store.search("t1", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);

        assert!(store.search("t2", &[1.0, 0.0], 3).await.unwrap().is_empty());

        assert_eq!(store.document_count().await.unwrap(), 2);
        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert_eq!(store.document_count().await.unwrap(), 0);
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let embedding = vec![0.25_f32, -1.5, 3.0];
        let bytes = SqliteVectorStore::embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(SqliteVectorStore::bytes_to_embedding(&bytes), embedding);
    }
}
