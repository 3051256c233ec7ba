//! Stub components for pipeline tests.

use crate::config::{Prompts, Settings};
use crate::embedding::Embedder;
use crate::error::{Result, TubetalkError};
use crate::llm::{LanguageModel, PromptMessage};
use crate::orchestrator::Orchestrator;
use crate::store::SqliteStore;
use crate::transcript::{Transcript, TranscriptFetcher, TranscriptSegment};
use crate::vector_store::SqliteVectorStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replies with a fixed string and records the prompts it was sent.
pub struct CannedModel {
    pub reply: Mutex<String>,
    pub prompts: Mutex<Vec<PromptMessage>>,
    pub calls: AtomicUsize,
}

impl CannedModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Mutex::new(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = reply.to_string();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for CannedModel {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().extend_from_slice(messages);
        Ok(self.reply.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

/// Returns the same segments for any video ID; `None` simulates a captions failure.
pub struct StubFetcher {
    pub segments: Option<Vec<TranscriptSegment>>,
    pub calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments: Some(segments),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            segments: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptFetcher for StubFetcher {
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.segments {
            Some(segments) => Ok(Transcript::new(video_id, segments.clone())),
            None => Err(TubetalkError::TranscriptFetch(format!(
                "{}: captions disabled",
                video_id
            ))),
        }
    }
}

/// Embeds every text to the same unit vector.
pub struct StubEmbedder;

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }

    fn dimensions(&self) -> usize {
        3
    }
}

pub fn lecture() -> Transcript {
    Transcript::new(
        "abc12345678",
        vec![
            TranscriptSegment::new("welcome to the course", 0.0, 4.0),
            TranscriptSegment::new("a graph is a set of vertices", 4.0, 6.0),
            TranscriptSegment::new("trees are connected acyclic graphs", 10.0, 5.5),
        ],
    )
}

/// Orchestrator over in-memory stores and the given stubs.
pub fn orchestrator(fetcher: Arc<StubFetcher>, model: Arc<CannedModel>) -> Orchestrator {
    Orchestrator::with_components(
        Settings::default(),
        Prompts::default(),
        fetcher,
        Arc::new(StubEmbedder),
        model,
        Arc::new(SqliteStore::in_memory().unwrap()),
        Arc::new(SqliteVectorStore::in_memory().unwrap()),
    )
}
