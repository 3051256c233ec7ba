//! Data models for caption transcripts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::OnceLock;

/// A single caption line with its position in the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// How long the caption stays on screen, in seconds.
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }

    /// End time in seconds.
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// A complete transcript with segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Caption segments in playback order.
    pub segments: Vec<TranscriptSegment>,
    /// Full transcript text (concatenated segments).
    pub full_text: String,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

/// Flattened transcript text plus the character range each segment occupies.
#[derive(Debug, Clone)]
pub struct FlattenedTranscript {
    pub text: String,
    /// Character (not byte) ranges, one per segment.
    pub spans: Vec<Range<usize>>,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(video_id: impl Into<String>, segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let duration_seconds = segments
            .iter()
            .map(|s| s.end_seconds())
            .fold(0.0_f64, f64::max);

        Self {
            video_id: video_id.into(),
            segments,
            full_text,
            duration_seconds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render as `"text (start) text (start) ..."`, the compact inline-timestamp form
    /// the chat prompt is built from.
    pub fn flatten(&self) -> String {
        self.flatten_with_spans().text
    }

    /// Flatten and remember where each segment landed in the output.
    pub fn flatten_with_spans(&self) -> FlattenedTranscript {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(self.segments.len());
        let mut cursor = 0usize;

        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                text.push(' ');
                cursor += 1;
            }
            let piece = format!("{} ({})", segment.text, format_seconds(segment.start_seconds));
            let len = piece.chars().count();
            text.push_str(&piece);
            spans.push(cursor..cursor + len);
            cursor += len;
        }

        FlattenedTranscript { text, spans }
    }

    /// Format the transcript as `[12.5s] text` lines for summary and outline prompts.
    pub fn format_with_timestamps(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("[{}s] {}", format_seconds(s.start_seconds), s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Latest caption start time, used as the reported video length.
    pub fn last_start_seconds(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.start_seconds)
            .fold(0.0_f64, f64::max)
    }
}

fn flattened_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.*?)\((\d+\.?\d*)\)").expect("Invalid regex"))
}

/// Recover segments from a flattened `"text (start)"` string.
///
/// Each segment's duration runs until the next timestamp; the last one gets zero.
/// Matches with empty text are skipped.
pub fn parse_flattened(text: &str) -> Vec<TranscriptSegment> {
    let matches: Vec<(String, f64)> = flattened_segment_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let body = caps.get(1)?.as_str().trim().to_string();
            let start = caps.get(2)?.as_str().parse::<f64>().ok()?;
            Some((body, start))
        })
        .collect();

    matches
        .iter()
        .enumerate()
        .filter(|(_, (body, _))| !body.is_empty())
        .map(|(i, (body, start))| {
            let duration = matches
                .get(i + 1)
                .map(|(_, next)| (next - start).max(0.0))
                .unwrap_or(0.0);
            TranscriptSegment::new(body.clone(), *start, duration)
        })
        .collect()
}

/// Render seconds the way a float literal prints (`0.0`, `12.5`).
pub fn format_seconds(seconds: f64) -> String {
    format!("{:?}", seconds)
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        Transcript::new(
            "abc12345678",
            vec![
                TranscriptSegment::new("welcome to the lecture", 0.0, 2.5),
                TranscriptSegment::new("today we cover graphs", 2.5, 3.0),
                TranscriptSegment::new("a graph has vertices (nodes)", 5.5, 4.25),
            ],
        )
    }

    #[test]
    fn test_transcript_creation() {
        let transcript = sample();
        assert_eq!(
            transcript.full_text,
            "welcome to the lecture today we cover graphs a graph has vertices (nodes)"
        );
        assert_eq!(transcript.duration_seconds, 9.75);
        assert_eq!(transcript.last_start_seconds(), 5.5);
    }

    #[test]
    fn test_flatten_uses_float_literal_timestamps() {
        let flat = sample().flatten();
        assert_eq!(
            flat,
            "welcome to the lecture (0.0) today we cover graphs (2.5) a graph has vertices (nodes) (5.5)"
        );
    }

    #[test]
    fn test_reparse_recovers_segment_count() {
        let transcript = sample();
        let parsed = parse_flattened(&transcript.flatten());

        assert_eq!(parsed.len(), transcript.segments.len());
        assert_eq!(parsed[0].text, "welcome to the lecture");
        assert_eq!(parsed[1].start_seconds, 2.5);
        assert_eq!(parsed[2].text, "a graph has vertices (nodes)");
        assert_eq!(parsed[0].duration_seconds, 2.5);
        assert_eq!(parsed[2].duration_seconds, 0.0);
    }

    #[test]
    fn test_spans_point_at_each_segment() {
        let transcript = sample();
        let flat = transcript.flatten_with_spans();
        let chars: Vec<char> = flat.text.chars().collect();

        for (segment, span) in transcript.segments.iter().zip(&flat.spans) {
            let piece: String = chars[span.clone()].iter().collect();
            assert!(piece.starts_with(&segment.text));
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3665.0), "01:01:05");
    }

    #[test]
    fn test_format_with_timestamps() {
        let lines = sample().format_with_timestamps();
        assert!(lines.starts_with("[0.0s] welcome to the lecture\n[2.5s] today"));
    }
}
