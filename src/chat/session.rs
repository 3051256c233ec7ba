//! Chat session state machine.
//!
//! `New` → `Ready` via [`ChatSession::start`] or [`ChatSession::resume`];
//! each [`ChatSession::ask`] passes through `Answering` and returns to `Ready`.
//! A fresh thread lives in an in-memory index until its first answer, when the
//! thread row, URL, transcript and embeddings are written to the database.

use crate::error::{Result, TubetalkError};
use crate::orchestrator::Orchestrator;
use crate::rag::{Answer, RagResponse};
use crate::store::{ChatMessage, ConversationStore};
use crate::transcript::{extract_video_id, Transcript};
use crate::vector_store::{MemoryVectorStore, VectorStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Ready,
    Answering,
}

/// An interactive conversation about one video.
pub struct ChatSession<'a> {
    orchestrator: &'a Orchestrator,
    state: SessionState,
    thread_id: Option<String>,
    video_url: Option<String>,
    transcript: Option<Transcript>,
    index: Option<Arc<dyn VectorStore>>,
    persisted: bool,
    history: Vec<ChatMessage>,
}

impl<'a> ChatSession<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self {
            orchestrator,
            state: SessionState::New,
            thread_id: None,
            video_url: None,
            transcript: None,
            index: None,
            persisted: false,
            history: Vec::new(),
        }
    }

    /// A fresh random thread name.
    pub fn generate_thread_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Messages of this thread, oldest first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state != expected {
            return Err(TubetalkError::Chat(format!(
                "session is {:?}, expected {:?}",
                self.state, expected
            )));
        }
        Ok(())
    }

    /// Open a new thread on the video at `url`.
    ///
    /// Nothing is written to the database until the first answer.
    #[instrument(skip(self))]
    pub async fn start(&mut self, url: &str, thread_id: &str) -> Result<()> {
        self.expect_state(SessionState::New)?;

        let url = url.trim();
        let thread_id = thread_id.trim();
        if url.is_empty() {
            return Err(TubetalkError::MissingInput("YouTube URL".to_string()));
        }
        if thread_id.is_empty() {
            return Err(TubetalkError::MissingInput("conversation name".to_string()));
        }
        if extract_video_id(url).is_none() {
            return Err(TubetalkError::InvalidUrl(url.to_string()));
        }

        let store = self.orchestrator.store();
        if store.thread_exists(thread_id)? {
            return Err(TubetalkError::ThreadExists(thread_id.to_string()));
        }

        let transcript = self.orchestrator.load_transcript(url).await?;
        let index: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let chunks = self
            .orchestrator
            .index_transcript(thread_id, &transcript, index.as_ref())
            .await?;

        info!(
            "Thread {} ready: {} segments, {} chunks",
            thread_id,
            transcript.segments.len(),
            chunks
        );

        self.thread_id = Some(thread_id.to_string());
        self.video_url = Some(url.to_string());
        self.transcript = Some(transcript);
        self.index = Some(index);
        self.persisted = false;
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Reopen a persisted thread and replay its history.
    #[instrument(skip(self))]
    pub async fn resume(&mut self, thread_id: &str) -> Result<()> {
        self.expect_state(SessionState::New)?;

        let thread_id = thread_id.trim();
        if thread_id.is_empty() {
            return Err(TubetalkError::MissingInput("conversation name".to_string()));
        }

        let store = self.orchestrator.store();
        let info = store
            .get_thread(thread_id)?
            .ok_or_else(|| TubetalkError::ThreadNotFound(thread_id.to_string()))?;
        let video_url = store.get_url(thread_id)?.or(info.video_url);
        let transcript = store.get_transcript(thread_id)?;
        let history = store.messages(thread_id).await?;

        let index = self.orchestrator.vector_store();
        if index.get_by_thread(thread_id).await?.is_empty() {
            match &transcript {
                Some(t) => {
                    warn!("Thread {} has no index, rebuilding", thread_id);
                    self.orchestrator
                        .index_transcript(thread_id, t, index.as_ref())
                        .await?;
                }
                None => warn!("Thread {} has neither index nor transcript", thread_id),
            }
        }

        info!("Resumed thread {} with {} messages", thread_id, history.len());

        self.thread_id = Some(thread_id.to_string());
        self.video_url = video_url;
        self.transcript = transcript;
        self.index = Some(index);
        self.persisted = true;
        self.history = history;
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Answer a question about the video.
    ///
    /// On failure the session is back in `Ready` and nothing was recorded.
    pub async fn ask(&mut self, question: &str) -> Result<RagResponse> {
        self.expect_state(SessionState::Ready)?;

        let question = question.trim();
        if question.is_empty() {
            return Err(TubetalkError::MissingInput("question".to_string()));
        }

        self.state = SessionState::Answering;
        let result = self.answer(question).await;
        self.state = SessionState::Ready;
        result
    }

    #[instrument(skip(self))]
    async fn answer(&mut self, question: &str) -> Result<RagResponse> {
        let (thread_id, index) = match (&self.thread_id, &self.index) {
            (Some(thread), Some(index)) => (thread.clone(), index.clone()),
            _ => return Err(TubetalkError::Chat("session has no thread".to_string())),
        };

        let engine = self.orchestrator.rag_engine(index);
        let response = engine
            .ask(&thread_id, question, self.video_url.as_deref())
            .await?;

        if !self.persisted {
            self.persist(&thread_id).await?;
        }

        self.record(&thread_id, question, &response.answer).await?;
        Ok(response)
    }

    /// Write the thread and its index to the database.
    async fn persist(&mut self, thread_id: &str) -> Result<()> {
        let store = self.orchestrator.store();
        let url = self.video_url.clone().unwrap_or_default();

        store.create_thread(thread_id, &url)?;
        store.save_url(thread_id, &url)?;
        if let Some(transcript) = &self.transcript {
            store.save_transcript(thread_id, transcript)?;
        }

        let persistent = self.orchestrator.vector_store();
        if let Some(memory) = &self.index {
            let docs = memory.get_by_thread(thread_id).await?;
            persistent.upsert_batch(&docs).await?;
        }

        info!("Persisted thread {}", thread_id);
        self.index = Some(persistent);
        self.persisted = true;
        Ok(())
    }

    async fn record(&mut self, thread_id: &str, question: &str, answer: &Answer) -> Result<()> {
        let store = self.orchestrator.store();
        let user = ChatMessage::user(question);
        let assistant = ChatMessage::assistant(answer.text(), answer.timestamp);

        store.append_message(thread_id, &user).await?;
        store.append_message(thread_id, &assistant).await?;

        self.history.push(user);
        self.history.push(assistant);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Role;
    use crate::testing::{orchestrator, CannedModel, StubFetcher};
    use crate::transcript::TranscriptSegment;

    const URL: &str = "https://www.youtube.com/watch?v=abc12345678";
    const INTRO_ANSWER: &str = r#"{"answer": ["intro"], "timestamp": 0.0}"#;

    fn setup(reply: &str) -> (Orchestrator, Arc<CannedModel>) {
        let fetcher = Arc::new(StubFetcher::new(vec![TranscriptSegment::new("intro", 0.0, 3.0)]));
        let model = Arc::new(CannedModel::new(reply));
        (orchestrator(fetcher, model.clone()), model)
    }

    #[tokio::test]
    async fn test_first_question_persists_thread() {
        let (orch, model) = setup(INTRO_ANSWER);
        let mut session = ChatSession::new(&orch);

        session.start(URL, "t1").await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert!(orch.list_threads().unwrap().is_empty());

        let response = session.ask("What is this about?").await.unwrap();
        assert_eq!(response.answer.render(), "intro\nTimestamp: 0.0");
        assert_eq!(session.state(), SessionState::Ready);

        let threads = orch.list_threads().unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].thread_id, "t1");
        assert_eq!(threads[0].video_url.as_deref(), Some(URL));

        let store = orch.store();
        let messages = store.messages("t1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is this about?");
        assert_eq!(messages[1].render(), "intro\nTimestamp: 0.0");
        assert_eq!(store.get_url("t1").unwrap().as_deref(), Some(URL));
        assert_eq!(store.get_transcript("t1").unwrap().unwrap().flatten(), "intro (0.0)");
        assert_eq!(orch.vector_store().get_by_thread("t1").await.unwrap().len(), 1);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts[1].content, "Transcript:\nintro (0.0)");
    }

    #[tokio::test]
    async fn test_missing_input_leaves_session_new() {
        let (orch, _) = setup(INTRO_ANSWER);
        let mut session = ChatSession::new(&orch);

        assert!(matches!(
            session.start("", "t1").await,
            Err(TubetalkError::MissingInput(_))
        ));
        assert!(matches!(
            session.start(URL, "  ").await,
            Err(TubetalkError::MissingInput(_))
        ));
        assert_eq!(session.state(), SessionState::New);
        assert!(session.ask("hello?").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_thread_name_is_rejected() {
        let (orch, _) = setup(INTRO_ANSWER);

        let mut first = ChatSession::new(&orch);
        first.start(URL, "t1").await.unwrap();
        first.ask("What is this about?").await.unwrap();

        let mut second = ChatSession::new(&orch);
        let err = second.start(URL, "t1").await.unwrap_err();
        assert!(matches!(err, TubetalkError::ThreadExists(_)));
        assert_eq!(err.to_string(), "Conversation name already exists: t1");
    }

    #[tokio::test]
    async fn test_malformed_answer_appends_nothing() {
        let (orch, model) = setup("the video is about an intro");
        let mut session = ChatSession::new(&orch);
        session.start(URL, "t1").await.unwrap();

        let err = session.ask("What is this about?").await.unwrap_err();
        assert!(matches!(err, TubetalkError::MalformedResponse(_)));
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.history().is_empty());
        assert!(orch.list_threads().unwrap().is_empty());

        model.set_reply(INTRO_ANSWER);
        session.ask("What is this about?").await.unwrap();
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_resume_replays_history() {
        let (orch, _) = setup(INTRO_ANSWER);
        {
            let mut session = ChatSession::new(&orch);
            session.start(URL, "t1").await.unwrap();
            session.ask("What is this about?").await.unwrap();
            session.ask("And then?").await.unwrap();
        }

        let mut resumed = ChatSession::new(&orch);
        resumed.resume("t1").await.unwrap();
        assert_eq!(resumed.history().len(), 4);
        assert_eq!(resumed.video_url(), Some(URL));

        resumed.ask("Anything else?").await.unwrap();
        assert_eq!(orch.store().message_count("t1").await.unwrap(), 6);

        let mut missing = ChatSession::new(&orch);
        assert!(matches!(
            missing.resume("nope").await,
            Err(TubetalkError::ThreadNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_session_new() {
        let orch = orchestrator(
            Arc::new(StubFetcher::failing()),
            Arc::new(CannedModel::new(INTRO_ANSWER)),
        );
        let mut session = ChatSession::new(&orch);

        assert!(matches!(
            session.start(URL, "t1").await,
            Err(TubetalkError::TranscriptFetch(_))
        ));
        assert_eq!(session.state(), SessionState::New);
    }

    const OTHER_URL: &str = "https://www.youtube.com/watch?v=bbbbbbbbbbb";

    fn quiz_about(subject: &str) -> String {
        format!(
            r#"{{"quizzes": [{{"question": "About {}?", "options": ["yes", "no", "maybe", "never"],
                "correct_answer": "yes", "timestamp": 0.0}}]}}"#,
            subject
        )
    }

    #[tokio::test]
    async fn test_quiz_from_another_video_is_not_reused_after_chat() {
        let (orch, model) = setup(&quiz_about("video B"));
        orch.quiz(OTHER_URL, Some("t1"), false).await.unwrap();

        model.set_reply(INTRO_ANSWER);
        let mut session = ChatSession::new(&orch);
        session.start(URL, "t1").await.unwrap();
        session.ask("What is this about?").await.unwrap();

        model.set_reply(&quiz_about("video A"));
        let quiz = orch.quiz(URL, Some("t1"), false).await.unwrap();
        assert!(!quiz.cached);
        assert_eq!(quiz.value.quizzes[0].question, "About video A?");

        let again = orch.quiz(URL, Some("t1"), false).await.unwrap();
        assert!(again.cached);
    }

    #[tokio::test]
    async fn test_study_material_cannot_rebind_chat_thread() {
        let (orch, model) = setup(INTRO_ANSWER);
        {
            let mut session = ChatSession::new(&orch);
            session.start(URL, "t1").await.unwrap();
            session.ask("What is this about?").await.unwrap();
        }

        model.set_reply(&quiz_about("video B"));
        let err = orch.quiz(OTHER_URL, Some("t1"), false).await.unwrap_err();
        assert!(matches!(
            err,
            TubetalkError::ThreadVideoMismatch { ref video_id, .. } if video_id == "abc12345678"
        ));

        let mut resumed = ChatSession::new(&orch);
        resumed.resume("t1").await.unwrap();
        assert_eq!(resumed.video_url(), Some(URL));
        assert_eq!(resumed.transcript().map(|t| t.video_id.as_str()), Some("abc12345678"));

        let same_video = orch.quiz(URL, Some("t1"), false).await.unwrap();
        assert!(!same_video.cached);
    }
}
