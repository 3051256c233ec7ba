//! Pipeline orchestrator for TubeTalk.
//!
//! Owns every component and runs the transcript, indexing and study pipelines.

use crate::chunking::{ChunkingConfig, WindowChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TubetalkError};
use crate::llm::{LanguageModel, OpenAIChatModel};
use crate::rag::RagEngine;
use crate::store::{ArtifactKind, ChatMessage, ConversationStore, SqliteStore, ThreadInfo};
use crate::study::{Quiz, QuizGenerator, SummaryGenerator, SummaryReport, TopicExtractor, TopicOutline};
use crate::transcript::{extract_video_id, Transcript, TranscriptFetcher, YoutubeTranscriptFetcher};
use crate::vector_store::{Document, SqliteVectorStore, VectorStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the TubeTalk pipelines.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    fetcher: Arc<dyn TranscriptFetcher>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
    store: Arc<SqliteStore>,
    vector_store: Arc<SqliteVectorStore>,
}

/// Generated study material and where it came from.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub value: T,
    /// Loaded from the store instead of generated.
    pub cached: bool,
    /// Raw model reply, when freshly generated.
    pub model_response: Option<String>,
}

impl Orchestrator {
    /// Create an orchestrator backed by YouTube, OpenAI and the configured database.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let fetcher = Arc::new(YoutubeTranscriptFetcher::new(&settings.transcript)?);
        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding));
        let model = Arc::new(OpenAIChatModel::from_settings(&settings.llm));

        let db_path = settings.database_path();
        let store = Arc::new(SqliteStore::new(&db_path)?);
        let vector_store = Arc::new(SqliteVectorStore::new(&db_path)?);

        info!("Using model {} and database {:?}", settings.llm.model, db_path);

        Ok(Self::with_components(
            settings,
            prompts,
            fetcher,
            embedder,
            model,
            store,
            vector_store,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        fetcher: Arc<dyn TranscriptFetcher>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        store: Arc<SqliteStore>,
        vector_store: Arc<SqliteVectorStore>,
    ) -> Self {
        Self {
            settings,
            prompts,
            fetcher,
            embedder,
            model,
            store,
            vector_store,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> Arc<SqliteStore> {
        self.store.clone()
    }

    /// Persistent vector index (as trait object).
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone() as Arc<dyn VectorStore>
    }

    /// Chat engine answering from `index`.
    pub fn rag_engine(&self, index: Arc<dyn VectorStore>) -> RagEngine {
        RagEngine::new(
            index,
            self.embedder.clone(),
            self.model.clone(),
            &self.settings.retrieval,
        )
        .with_prompts(self.prompts.clone())
    }

    /// Fetch the transcript of the video at `url`.
    #[instrument(skip(self))]
    pub async fn load_transcript(&self, url: &str) -> Result<Transcript> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TubetalkError::MissingInput("YouTube URL".to_string()));
        }
        crate::transcript::load_transcript(self.fetcher.as_ref(), url).await
    }

    /// Chunk, embed and index a transcript under `thread_id`.
    #[instrument(skip(self, transcript, index), fields(video_id = %transcript.video_id))]
    pub async fn index_transcript(
        &self,
        thread_id: &str,
        transcript: &Transcript,
        index: &dyn VectorStore,
    ) -> Result<usize> {
        let chunker = WindowChunker::new(ChunkingConfig::from(&self.settings.chunking));
        let chunks = chunker.chunk(transcript);
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::from_chunk(thread_id, chunk, embedding))
            .collect();

        let count = index.upsert_batch(&documents).await?;
        info!("Indexed {} chunks for thread {}", count, thread_id);
        Ok(count)
    }

    /// Video id of `url`, checked against the chat thread `thread_id` is bound to.
    ///
    /// Study material may share a name with a chat thread only for the same video.
    fn study_video_id(&self, url: &str, thread_id: Option<&str>) -> Result<String> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TubetalkError::MissingInput("YouTube URL".to_string()));
        }
        let video_id = extract_video_id(url)
            .ok_or_else(|| TubetalkError::InvalidUrl(url.to_string()))?;

        if let Some(thread) = thread_id {
            let bound = self
                .store
                .get_thread(thread)?
                .and_then(|info| info.video_url)
                .and_then(|u| extract_video_id(&u));
            if let Some(bound) = bound {
                if bound != video_id {
                    return Err(TubetalkError::ThreadVideoMismatch {
                        thread_id: thread.to_string(),
                        video_id: bound,
                    });
                }
            }
        }

        Ok(video_id)
    }

    /// Transcript for a study pipeline, reusing the thread's stored copy when it is the same video.
    async fn transcript_for(
        &self,
        url: &str,
        video_id: &str,
        thread_id: Option<&str>,
    ) -> Result<Transcript> {
        if let Some(thread) = thread_id {
            if let Some(stored) = self.store.get_transcript(thread)? {
                if stored.video_id == video_id {
                    return Ok(stored);
                }
            }
        }

        let transcript = self.load_transcript(url).await?;
        if let Some(thread) = thread_id {
            self.store.save_transcript(thread, &transcript)?;
            self.store.save_url(thread, url.trim())?;
        }
        Ok(transcript)
    }

    /// Stored artifact for the thread, if it was generated from `video_id`.
    fn cached<T: DeserializeOwned>(
        &self,
        kind: ArtifactKind,
        video_id: &str,
        thread_id: Option<&str>,
        regenerate: bool,
    ) -> Result<Option<T>> {
        let Some(thread) = thread_id else {
            return Ok(None);
        };
        if regenerate {
            return Ok(None);
        }
        let Some(artifact) = self.store.get_artifact(kind, thread)? else {
            return Ok(None);
        };

        if artifact.video_id != video_id {
            warn!(
                "Thread {} holds {:?} for video {}, regenerating",
                thread, kind, artifact.video_id
            );
            return Ok(None);
        }

        match serde_json::from_str(&artifact.output) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Stored {:?} for thread {} is unreadable, regenerating: {}", kind, thread, e);
                Ok(None)
            }
        }
    }

    fn persist<T: Serialize>(
        &self,
        kind: ArtifactKind,
        thread_id: Option<&str>,
        video_id: &str,
        value: &T,
    ) -> Result<()> {
        if let Some(thread) = thread_id {
            self.store
                .save_artifact(kind, thread, video_id, &serde_json::to_string(value)?)?;
        }
        Ok(())
    }

    /// Summarize the video at `url`.
    #[instrument(skip(self))]
    pub async fn summary(
        &self,
        url: &str,
        thread_id: Option<&str>,
        regenerate: bool,
    ) -> Result<Generated<SummaryReport>> {
        let video_id = self.study_video_id(url, thread_id)?;
        if let Some(report) = self.cached(ArtifactKind::Summary, &video_id, thread_id, regenerate)? {
            info!("Loaded summary from store");
            return Ok(Generated { value: report, cached: true, model_response: None });
        }

        let transcript = self.transcript_for(url, &video_id, thread_id).await?;
        let generator = SummaryGenerator::new(self.model.clone(), self.prompts.clone());
        let (report, reply) = generator.generate(&transcript).await?;
        self.persist(ArtifactKind::Summary, thread_id, &video_id, &report)?;

        Ok(Generated { value: report, cached: false, model_response: Some(reply) })
    }

    /// Extract the topic outline of the video at `url`.
    #[instrument(skip(self))]
    pub async fn topics(
        &self,
        url: &str,
        thread_id: Option<&str>,
        regenerate: bool,
    ) -> Result<Generated<TopicOutline>> {
        let video_id = self.study_video_id(url, thread_id)?;
        if let Some(outline) = self.cached(ArtifactKind::Topics, &video_id, thread_id, regenerate)? {
            info!("Loaded topics from store");
            return Ok(Generated { value: outline, cached: true, model_response: None });
        }

        let transcript = self.transcript_for(url, &video_id, thread_id).await?;
        let extractor = TopicExtractor::new(self.model.clone(), self.prompts.clone());
        let outline = extractor.extract(&transcript).await?;
        self.persist(ArtifactKind::Topics, thread_id, &video_id, &outline)?;

        Ok(Generated { value: outline, cached: false, model_response: None })
    }

    /// Build a quiz for the video at `url`.
    #[instrument(skip(self))]
    pub async fn quiz(
        &self,
        url: &str,
        thread_id: Option<&str>,
        regenerate: bool,
    ) -> Result<Generated<Quiz>> {
        let video_id = self.study_video_id(url, thread_id)?;
        if let Some(quiz) = self.cached(ArtifactKind::Quiz, &video_id, thread_id, regenerate)? {
            info!("Loaded quiz from store");
            return Ok(Generated { value: quiz, cached: true, model_response: None });
        }

        let transcript = self.transcript_for(url, &video_id, thread_id).await?;
        let generator = QuizGenerator::new(
            self.model.clone(),
            self.prompts.clone(),
            self.settings.quiz.question_count,
        );
        let quiz = generator.generate(&transcript).await?;
        self.persist(ArtifactKind::Quiz, thread_id, &video_id, &quiz)?;

        Ok(Generated { value: quiz, cached: false, model_response: None })
    }

    pub fn list_threads(&self) -> Result<Vec<ThreadInfo>> {
        self.store.list_threads()
    }

    /// Metadata and full history of one thread.
    pub async fn thread_history(&self, thread_id: &str) -> Result<(ThreadInfo, Vec<ChatMessage>)> {
        let info = self
            .store
            .get_thread(thread_id)?
            .ok_or_else(|| TubetalkError::ThreadNotFound(thread_id.to_string()))?;
        let messages = self.store.messages(thread_id).await?;
        Ok((info, messages))
    }

    /// Number of chunks in the persistent index across all threads.
    pub async fn indexed_chunk_count(&self) -> Result<usize> {
        self.vector_store.document_count().await
    }

    /// Delete every thread and its index. Returns `(threads, embeddings)` removed.
    #[instrument(skip(self))]
    pub async fn delete_all_threads(&self) -> Result<(usize, usize)> {
        let threads = self.store.delete_all_threads()?;
        let embeddings = self.vector_store.delete_all().await?;
        info!("Deleted {} threads and {} embeddings", threads, embeddings);
        Ok((threads, embeddings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{orchestrator, CannedModel, StubFetcher};
    use crate::transcript::TranscriptSegment;
    use crate::vector_store::MemoryVectorStore;

    const URL: &str = "https://www.youtube.com/watch?v=abc12345678";

    const QUIZ: &str = r#"{"quizzes": [{"question": "What is covered?", "options": ["intro", "outro", "graphs", "trees"],
        "correct_answer": "intro", "timestamp": 0.0}]}"#;

    fn intro_fetcher() -> Arc<StubFetcher> {
        Arc::new(StubFetcher::new(vec![TranscriptSegment::new("intro", 0.0, 3.0)]))
    }

    #[tokio::test]
    async fn test_load_transcript_requires_url() {
        let orch = orchestrator(intro_fetcher(), Arc::new(CannedModel::new("{}")));

        assert!(matches!(
            orch.load_transcript("  ").await,
            Err(TubetalkError::MissingInput(_))
        ));
        assert!(matches!(
            orch.load_transcript("https://example.com/nothing").await,
            Err(TubetalkError::InvalidUrl(_))
        ));

        let transcript = orch.load_transcript(URL).await.unwrap();
        assert_eq!(transcript.video_id, "abc12345678");
        assert_eq!(transcript.flatten(), "intro (0.0)");
    }

    #[tokio::test]
    async fn test_index_transcript() {
        let orch = orchestrator(intro_fetcher(), Arc::new(CannedModel::new("{}")));
        let transcript = orch.load_transcript(URL).await.unwrap();
        let index = MemoryVectorStore::new();

        assert_eq!(orch.index_transcript("t1", &transcript, &index).await.unwrap(), 1);
        let docs = index.get_by_thread("t1").await.unwrap();
        assert_eq!(docs[0].content, "intro (0.0)");
        assert_eq!(docs[0].end_seconds, 3.0);
    }

    #[tokio::test]
    async fn test_quiz_is_generated_once_per_thread() {
        let fetcher = intro_fetcher();
        let model = Arc::new(CannedModel::new(QUIZ));
        let orch = orchestrator(fetcher.clone(), model.clone());

        let first = orch.quiz(URL, Some("t1"), false).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.value.len(), 1);

        let second = orch.quiz(URL, Some("t1"), false).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.value, first.value);
        assert_eq!(model.calls(), 1);

        let third = orch.quiz(URL, Some("t1"), true).await.unwrap();
        assert!(!third.cached);
        assert_eq!(model.calls(), 2);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_artifact_for_other_video_is_regenerated() {
        let model = Arc::new(CannedModel::new(QUIZ));
        let orch = orchestrator(intro_fetcher(), model.clone());

        orch.quiz(URL, Some("t1"), false).await.unwrap();
        let other = orch
            .quiz("https://youtu.be/zyx98765432", Some("t1"), false)
            .await
            .unwrap();

        assert!(!other.cached);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_summary_without_thread_is_not_stored() {
        let reply = r#"{"title": "Intro", "overview": "o", "key_points": [], "main_topics": [], "duration_summary": "d"}"#;
        let orch = orchestrator(intro_fetcher(), Arc::new(CannedModel::new(reply)));

        let summary = orch.summary(URL, None, false).await.unwrap();
        assert_eq!(summary.value.total_segments, 1);
        assert_eq!(summary.model_response.as_deref(), Some(reply));
        assert!(orch.list_threads().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces() {
        let orch = orchestrator(Arc::new(StubFetcher::failing()), Arc::new(CannedModel::new(QUIZ)));
        assert!(matches!(
            orch.topics(URL, Some("t1"), false).await,
            Err(TubetalkError::TranscriptFetch(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_all_threads_clears_embeddings() {
        let orch = orchestrator(intro_fetcher(), Arc::new(CannedModel::new(QUIZ)));
        let transcript = orch.load_transcript(URL).await.unwrap();

        orch.store().create_thread("t1", URL).unwrap();
        orch.quiz(URL, Some("t1"), false).await.unwrap();
        orch
            .index_transcript("t1", &transcript, orch.vector_store().as_ref())
            .await
            .unwrap();
        assert_eq!(orch.indexed_chunk_count().await.unwrap(), 1);

        assert_eq!(orch.delete_all_threads().await.unwrap(), (1, 1));
        assert!(orch.vector_store().get_by_thread("t1").await.unwrap().is_empty());
        assert_eq!(orch.indexed_chunk_count().await.unwrap(), 0);
        assert!(orch.list_threads().unwrap().is_empty());
        assert!(orch.store().get_artifact(ArtifactKind::Quiz, "t1").unwrap().is_none());
    }
}
