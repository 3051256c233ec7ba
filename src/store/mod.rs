//! Persistence for threads, conversations and generated study material.

mod sqlite;

pub use sqlite::{ArtifactKind, SqliteStore, StoredArtifact, THREAD_TABLES};

use crate::error::{Result, TubetalkError};
use crate::transcript::format_seconds;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = TubetalkError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(TubetalkError::Store(format!("Unknown message role: {}", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of a conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    /// Message text. For assistant messages this is the answer without its timestamp.
    pub content: String,
    /// Video position the answer was taken from (assistant messages only).
    pub timestamp: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: f64) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(timestamp),
            created_at: Utc::now(),
        }
    }

    /// Text form of the message: assistant answers end with `\nTimestamp: <seconds>`.
    pub fn render(&self) -> String {
        match self.timestamp {
            Some(ts) => format!("{}\nTimestamp: {}", self.content, format_seconds(ts)),
            None => self.content.clone(),
        }
    }
}

/// Summary row for a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub thread_id: String,
    pub video_url: Option<String>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Trait for per-thread conversation persistence.
///
/// Histories are append-only; the only removal is a bulk delete of all threads.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append a message and return the thread's new message count.
    async fn append_message(&self, thread_id: &str, message: &ChatMessage) -> Result<usize>;

    /// Replay a thread's full history in order.
    async fn messages(&self, thread_id: &str) -> Result<Vec<ChatMessage>>;

    /// Number of messages in a thread.
    async fn message_count(&self, thread_id: &str) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_assistant_message() {
        assert_eq!(ChatMessage::assistant("intro", 0.0).render(), "intro\nTimestamp: 0.0");
        assert_eq!(
            ChatMessage::assistant("graphs have edges", 125.5).render(),
            "graphs have edges\nTimestamp: 125.5"
        );
        assert_eq!(ChatMessage::user("What is this about?").render(), "What is this about?");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!("system".parse::<Role>().is_err());
    }
}
