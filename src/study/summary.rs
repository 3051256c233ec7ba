//! Structured video summaries.

use super::{require_segments, transcript_vars};
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{parse_json, LanguageModel, PromptMessage};
use crate::transcript::{format_timestamp, Transcript};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// A key point of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub content: String,
    pub timestamp: f64,
    /// high, medium or low.
    #[serde(default = "default_importance")]
    pub importance: String,
}

fn default_importance() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMarker {
    pub topic: String,
    pub timestamp: f64,
}

/// Model-generated summary of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub title: String,
    pub overview: String,
    #[serde(default)]
    pub key_points: Vec<KeyPoint>,
    #[serde(default)]
    pub main_topics: Vec<TopicMarker>,
    #[serde(default)]
    pub duration_summary: String,
}

/// Nested key-point grouping some replies use instead of a flat list.
#[derive(Debug, Deserialize)]
struct BriefSummary {
    #[serde(default)]
    key_points: Vec<KeyPoint>,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(flatten)]
    summary: VideoSummary,
    #[serde(default)]
    key_pt_brief_summary: Vec<BriefSummary>,
}

impl VideoSummary {
    /// Parse a model reply, flattening nested key-point groups.
    pub fn parse(response: &str) -> Result<Self> {
        let payload: SummaryPayload = parse_json(response)?;
        let mut summary = payload.summary;
        if summary.key_points.is_empty() {
            summary.key_points = payload
                .key_pt_brief_summary
                .into_iter()
                .flat_map(|b| b.key_points)
                .collect();
        }
        Ok(summary)
    }
}

/// A summary plus transcript statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub summary: VideoSummary,
    pub total_segments: usize,
    /// Start of the last caption, in seconds.
    pub video_duration: f64,
}

impl SummaryReport {
    pub fn new(summary: VideoSummary, transcript: &Transcript) -> Self {
        Self {
            summary,
            total_segments: transcript.segments.len(),
            video_duration: transcript.last_start_seconds(),
        }
    }

    /// Plain-text rendering for the terminal.
    pub fn format_for_display(&self) -> String {
        let s = &self.summary;
        let mut out = Vec::new();

        out.push(format!("Title: {}", s.title));
        out.push(format!("Duration: {:.1} seconds", self.video_duration));
        out.push(format!("Total Segments: {}", self.total_segments));
        out.push(String::new());

        out.push("MAIN TOPICS".to_string());
        for topic in &s.main_topics {
            out.push(format!("  • {} ({})", topic.topic, format_timestamp(topic.timestamp)));
        }
        out.push(String::new());

        out.push("OVERVIEW".to_string());
        out.push(s.overview.clone());
        out.push(String::new());

        out.push("KEY POINTS".to_string());
        for (i, point) in s.key_points.iter().enumerate() {
            out.push(format!("{}. {}", i + 1, point.content));
            out.push(format!(
                "   ⏰ {} | Importance: {}",
                format_timestamp(point.timestamp),
                point.importance
            ));
        }
        out.push(String::new());

        out.push("PACING".to_string());
        out.push(s.duration_summary.clone());

        out.join("\n")
    }
}

/// Summarizes transcripts with a language model.
pub struct SummaryGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl SummaryGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    /// Generate a summary. Also returns the raw model reply.
    #[instrument(skip(self, transcript), fields(video_id = %transcript.video_id))]
    pub async fn generate(&self, transcript: &Transcript) -> Result<(SummaryReport, String)> {
        require_segments(transcript)?;

        let vars = transcript_vars(transcript.format_with_timestamps());
        let messages = vec![
            PromptMessage::system(self.prompts.render_with_custom(&self.prompts.summary.system, &vars)),
            PromptMessage::user(self.prompts.render_with_custom(&self.prompts.summary.user, &vars)),
        ];

        let reply = self.model.complete(&messages).await?;
        let summary = VideoSummary::parse(&reply)?;

        info!("Summarized video into {} key points", summary.key_points.len());
        Ok((SummaryReport::new(summary, transcript), reply))
    }
}
