//! Pre-flight checks before expensive operations.
//!
//! Fails fast when the OpenAI key is missing instead of after the transcript download.

use crate::error::{Result, TubetalkError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chat needs embeddings and completions.
    Chat,
    /// Summary, topics and quiz need completions.
    Generate,
    /// Transcripts, threads and config are local or keyless.
    Browse,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Chat | Operation::Generate => check_api_key(std::env::var("OPENAI_API_KEY").ok()),
        Operation::Browse => Ok(()),
    }
}

fn check_api_key(key: Option<String>) -> Result<()> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(TubetalkError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(TubetalkError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
