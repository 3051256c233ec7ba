//! Hierarchical topic / timestamp outlines.

use super::{require_segments, transcript_vars};
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{parse_json, LanguageModel, PromptMessage};
use crate::transcript::{format_timestamp, Transcript};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtopic {
    pub subtopic: String,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainTopic {
    pub topic: String,
    pub timestamp: f64,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
}

/// Main topics of a video, each with its subtopics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopicOutline {
    pub main_topics: Vec<MainTopic>,
}

impl TopicOutline {
    /// Every `(label, timestamp)` pair in outline order, labelled `1`, `1.1`, `1.2`, `2`...
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut entries = Vec::new();
        for (i, topic) in self.main_topics.iter().enumerate() {
            entries.push(((i + 1).to_string(), topic.timestamp));
            for (j, sub) in topic.subtopics.iter().enumerate() {
                entries.push((format!("{}.{}", i + 1, j + 1), sub.timestamp));
            }
        }
        entries
    }

    /// Numbered outline for the terminal.
    pub fn format_for_display(&self) -> String {
        let mut lines = Vec::new();
        for (i, topic) in self.main_topics.iter().enumerate() {
            lines.push(format!(
                "{}: {} ⏰ {}",
                i + 1,
                topic.topic,
                format_timestamp(topic.timestamp)
            ));
            for (j, sub) in topic.subtopics.iter().enumerate() {
                let importance = sub
                    .importance
                    .as_ref()
                    .map(|imp| format!(" [{}]", imp))
                    .unwrap_or_default();
                lines.push(format!(
                    "   {}.{}: {} ⏰ {}{}",
                    i + 1,
                    j + 1,
                    sub.subtopic,
                    format_timestamp(sub.timestamp),
                    importance
                ));
            }
        }
        lines.join("\n")
    }
}

/// Extracts topic outlines with a language model.
pub struct TopicExtractor {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl TopicExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    #[instrument(skip(self, transcript), fields(video_id = %transcript.video_id))]
    pub async fn extract(&self, transcript: &Transcript) -> Result<TopicOutline> {
        require_segments(transcript)?;

        let vars = transcript_vars(transcript.format_with_timestamps());
        let messages = vec![
            PromptMessage::system(self.prompts.render_with_custom(&self.prompts.topics.system, &vars)),
            PromptMessage::user(self.prompts.render_with_custom(&self.prompts.topics.user, &vars)),
        ];

        let reply = self.model.complete(&messages).await?;
        let outline: TopicOutline = parse_json(&reply)?;

        info!("Extracted {} main topics", outline.main_topics.len());
        Ok(outline)
    }
}
