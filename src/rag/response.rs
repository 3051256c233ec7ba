//! Answer generation.

use super::{context::format_context_for_prompt, Answer, ContextBuilder, ContextChunk};
use crate::config::{Prompts, RetrievalSettings};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::llm::{LanguageModel, PromptMessage};
use crate::vector_store::VectorStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers questions about one indexed video.
pub struct RagEngine {
    model: Arc<dyn LanguageModel>,
    context_builder: ContextBuilder,
    prompts: Prompts,
}

impl RagEngine {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        retrieval: &RetrievalSettings,
    ) -> Self {
        let context_builder = ContextBuilder::new(vector_store, embedder)
            .with_max_chunks(retrieval.top_k)
            .with_min_score(retrieval.min_score);

        Self {
            model,
            context_builder,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Instruction, retrieved transcript excerpts, then the question.
    pub fn build_messages(&self, context: &[ContextChunk], question: &str) -> Vec<PromptMessage> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(context));
        vars.insert("question".to_string(), question.to_string());

        vec![
            PromptMessage::system(self.prompts.render_with_custom(&self.prompts.chat.system, &vars)),
            PromptMessage::system(self.prompts.render_with_custom(&self.prompts.chat.context, &vars)),
            PromptMessage::user(question),
        ]
    }

    /// Answer a question from the thread's index.
    #[instrument(skip(self, video_url), fields(question = %question))]
    pub async fn ask(
        &self,
        thread_id: &str,
        question: &str,
        video_url: Option<&str>,
    ) -> Result<RagResponse> {
        info!("Processing question in thread {}", thread_id);

        let sources = self.context_builder.build(thread_id, question, video_url).await?;
        let messages = self.build_messages(&sources, question);

        let reply = self.model.complete(&messages).await?;
        let answer = Answer::parse(&reply)?;

        debug!(
            "Answered from {} chunks at {}s",
            sources.len(),
            answer.timestamp
        );

        Ok(RagResponse { answer, sources })
    }
}

/// An answer with the chunks it was generated from.
#[derive(Debug, Clone)]
pub struct RagResponse {
    pub answer: Answer,
    pub sources: Vec<ContextChunk>,
}
