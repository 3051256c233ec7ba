//! Error types for TubeTalk.

use thiserror::Error;

/// Library-level error type for TubeTalk operations.
#[derive(Error, Debug)]
pub enum TubetalkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptFetch(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Conversation name already exists: {0}")]
    ThreadExists(String),

    #[error("Thread {thread_id} is about video {video_id}")]
    ThreadVideoMismatch { thread_id: String, video_id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

/// Result type alias for TubeTalk operations.
pub type Result<T> = std::result::Result<T, TubetalkError>;
