//! Study material generated from a transcript: summary, topic outline, quiz.
//!
//! Each generator sends one prompt to the language model and parses a JSON reply.
//! Results are serialized verbatim into the relational store, one per thread.

mod quiz;
mod summary;
mod topics;

pub use quiz::{Quiz, QuizGenerator, QuizQuestion};
pub use summary::{KeyPoint, SummaryGenerator, SummaryReport, TopicMarker, VideoSummary};
pub use topics::{MainTopic, Subtopic, TopicExtractor, TopicOutline};

use crate::error::{Result, TubetalkError};
use crate::transcript::Transcript;
use std::collections::HashMap;

fn transcript_vars(text: String) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("transcript".to_string(), text);
    vars
}

fn require_segments(transcript: &Transcript) -> Result<()> {
    if transcript.is_empty() {
        return Err(TubetalkError::TranscriptFetch(format!(
            "{}: no valid transcript segments found",
            transcript.video_id
        )));
    }
    Ok(())
}
