//! Language model seam shared by chat and the study generators.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::{Result, TubetalkError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One message of a model request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for chat-completion backends that answer with a JSON document.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send the messages and return the raw text of the reply.
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String>;

    /// Model name, for logs.
    fn name(&self) -> &str;
}

/// Cut the outermost JSON object or array out of a model reply.
///
/// Models sometimes wrap JSON in prose or code fences.
pub fn extract_json(response: &str) -> &str {
    let start = response.find(['{', '[']);
    let end = response.rfind(['}', ']']);

    match (start, end) {
        (Some(start), Some(end)) if end > start => &response[start..=end],
        _ => response.trim(),
    }
}

/// Parse a model reply into `T`.
pub fn parse_json<T: DeserializeOwned>(response: &str) -> Result<T> {
    serde_json::from_str(extract_json(response)).map_err(|e| {
        let preview: String = response.chars().take(500).collect();
        TubetalkError::MalformedResponse(format!("{}. Response was: {}", e, preview))
    })
}
