//! SQLite-backed thread, message and artifact storage.

use super::{ChatMessage, ConversationStore, ThreadInfo};
use crate::error::{Result, TubetalkError};
use crate::transcript::Transcript;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS threads (
        thread_id TEXT PRIMARY KEY,
        video_url TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        timestamp REAL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_messages_thread_id ON messages(thread_id);

    CREATE TABLE IF NOT EXISTS transcripts (
        thread_id TEXT PRIMARY KEY,
        video_id TEXT NOT NULL,
        segments TEXT NOT NULL,
        saved_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS urls (
        thread_id TEXT PRIMARY KEY,
        youtube_url TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS topics (
        thread_id TEXT PRIMARY KEY,
        video_id TEXT NOT NULL,
        output TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS quizzes (
        thread_id TEXT PRIMARY KEY,
        video_id TEXT NOT NULL,
        output TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS summaries (
        thread_id TEXT PRIMARY KEY,
        video_id TEXT NOT NULL,
        output TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
"#;

/// Tables cleared by [`SqliteStore::delete_all_threads`].
pub const THREAD_TABLES: &[&str] = &[
    "threads",
    "messages",
    "transcripts",
    "urls",
    "topics",
    "quizzes",
    "summaries",
];

/// Kinds of generated study material persisted per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Topics,
    Quiz,
    Summary,
}

impl ArtifactKind {
    fn table(&self) -> &'static str {
        match self {
            ArtifactKind::Topics => "topics",
            ArtifactKind::Quiz => "quizzes",
            ArtifactKind::Summary => "summaries",
        }
    }
}

/// Generated JSON and the video it was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub video_id: String,
    pub output: String,
}

/// Relational store for threads and everything derived from their video.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
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
            .map_err(|e| TubetalkError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn parse_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    /// Register a new thread. Fails if the name is taken.
    #[instrument(skip(self))]
    pub fn create_thread(&self, thread_id: &str, video_url: &str) -> Result<()> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO threads (thread_id, video_url, created_at) VALUES (?1, ?2, ?3)",
            params![thread_id, video_url, Utc::now().to_rfc3339()],
        )?;

        if inserted == 0 {
            return Err(TubetalkError::ThreadExists(thread_id.to_string()));
        }

        info!("Created thread {}", thread_id);
        Ok(())
    }

    pub fn thread_exists(&self, thread_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM threads WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get one thread's metadata.
    pub fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadInfo>> {
        let conn = self.lock()?;
        let info = conn
            .query_row(
                r#"
                SELECT t.thread_id, t.video_url, t.created_at,
                       (SELECT COUNT(*) FROM messages m WHERE m.thread_id = t.thread_id)
                FROM threads t WHERE t.thread_id = ?1
                "#,
                params![thread_id],
                Self::row_to_thread,
            )
            .optional()?;
        Ok(info)
    }

    /// List every thread, newest first.
    #[instrument(skip(self))]
    pub fn list_threads(&self) -> Result<Vec<ThreadInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.thread_id, t.video_url, t.created_at,
                   (SELECT COUNT(*) FROM messages m WHERE m.thread_id = t.thread_id)
            FROM threads t
            ORDER BY t.created_at DESC
            "#,
        )?;

        let threads = stmt
            .query_map([], Self::row_to_thread)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(threads)
    }

    fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<ThreadInfo> {
        let created_at: String = row.get(2)?;
        let count: i64 = row.get(3)?;
        Ok(ThreadInfo {
            thread_id: row.get(0)?,
            video_url: row.get(1)?,
            created_at: Self::parse_time(&created_at),
            message_count: count as usize,
        })
    }

    pub fn save_url(&self, thread_id: &str, url: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO urls (thread_id, youtube_url) VALUES (?1, ?2)",
            params![thread_id, url],
        )?;
        Ok(())
    }

    pub fn get_url(&self, thread_id: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let url = conn
            .query_row(
                "SELECT youtube_url FROM urls WHERE thread_id = ?1",
                params![thread_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(url)
    }

    /// Persist a transcript as its structured segment list.
    #[instrument(skip(self, transcript), fields(segments = transcript.segments.len()))]
    pub fn save_transcript(&self, thread_id: &str, transcript: &Transcript) -> Result<()> {
        let segments = serde_json::to_string(&transcript.segments)?;
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO transcripts (thread_id, video_id, segments, saved_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![thread_id, transcript.video_id, segments, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_transcript(&self, thread_id: &str) -> Result<Option<Transcript>> {
        let row: Option<(String, String)> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT video_id, segments FROM transcripts WHERE thread_id = ?1",
                params![thread_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
        };

        match row {
            Some((video_id, segments)) => {
                Ok(Some(Transcript::new(video_id, serde_json::from_str(&segments)?)))
            }
            None => Ok(None),
        }
    }

    /// Store generated JSON for a thread, replacing any previous version.
    #[instrument(skip(self, output))]
    pub fn save_artifact(
        &self,
        kind: ArtifactKind,
        thread_id: &str,
        video_id: &str,
        output: &str,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (thread_id, video_id, output, created_at) VALUES (?1, ?2, ?3, ?4)",
                kind.table()
            ),
            params![thread_id, video_id, output, Utc::now().to_rfc3339()],
        )?;
        debug!("Saved {:?} of {} for thread {}", kind, video_id, thread_id);
        Ok(())
    }

    pub fn get_artifact(&self, kind: ArtifactKind, thread_id: &str) -> Result<Option<StoredArtifact>> {
        let conn = self.lock()?;
        let artifact = conn
            .query_row(
                &format!("SELECT video_id, output FROM {} WHERE thread_id = ?1", kind.table()),
                params![thread_id],
                |row| {
                    Ok(StoredArtifact {
                        video_id: row.get(0)?,
                        output: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(artifact)
    }

    /// Empty every thread table. Other tables in the database are left alone.
    #[instrument(skip(self))]
    pub fn delete_all_threads(&self) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let threads: i64 = tx.query_row("SELECT COUNT(*) FROM threads", [], |row| row.get(0))?;
        for table in THREAD_TABLES {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }
        tx.commit()?;

        info!("Deleted {} threads", threads);
        Ok(threads as usize)
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    #[instrument(skip(self, message), fields(role = %message.role))]
    async fn append_message(&self, thread_id: &str, message: &ChatMessage) -> Result<usize> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO messages (thread_id, role, content, timestamp, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                thread_id,
                message.role.as_str(),
                message.content,
                message.timestamp,
                message.created_at.to_rfc3339(),
            ],
        )?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn messages(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT role, content, timestamp, created_at
            FROM messages WHERE thread_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map(params![thread_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(role, content, timestamp, created_at)| {
                Ok(ChatMessage {
                    role: role.parse()?,
                    content,
                    timestamp,
                    created_at: Self::parse_time(&created_at),
                })
            })
            .collect()
    }

    async fn message_count(&self, thread_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
