//! Configuration module for TubeTalk.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, QuizPrompts, SummaryPrompts, TopicPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LlmSettings, PromptSettings,
    QuizSettings, RetrievalSettings, ServerSettings, Settings, TranscriptSettings,
};
