//! Typed chat answers.

use crate::error::{Result, TubetalkError};
use crate::llm::extract_json;
use crate::transcript::format_seconds;
use serde::{Deserialize, Serialize};

const TIMESTAMP_DELIMITER: &str = "\nTimestamp: ";

/// A chat answer and the video position it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer points in order.
    pub points: Vec<String>,
    /// Seconds into the video.
    pub timestamp: f64,
}

/// Wire shape requested from the model.
#[derive(Debug, Deserialize)]
struct AnswerPayload {
    answer: OneOrMany,
    #[serde(alias = "timestamps")]
    timestamp: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Answer {
    pub fn new(points: Vec<String>, timestamp: f64) -> Self {
        Self { points, timestamp }
    }

    /// Parse a model reply.
    ///
    /// Accepts the JSON object `{"answer": [...], "timestamp": n}`, or the plain
    /// `text\nTimestamp: n` form.
    pub fn parse(response: &str) -> Result<Self> {
        let json_err = match serde_json::from_str::<AnswerPayload>(extract_json(response)) {
            Ok(payload) => {
                let points = match payload.answer {
                    OneOrMany::One(text) => vec![text],
                    OneOrMany::Many(points) => points,
                };
                return Self::validated(points, payload.timestamp);
            }
            Err(e) => e,
        };

        if response.contains(TIMESTAMP_DELIMITER) {
            return Self::from_delimited(response);
        }

        let preview: String = response.chars().take(500).collect();
        Err(TubetalkError::MalformedResponse(format!(
            "{}. Response was: {}",
            json_err, preview
        )))
    }

    /// Parse the rendered form produced by [`Answer::render`].
    ///
    /// The delimiter must appear exactly once and be followed by a number.
    pub fn from_delimited(text: &str) -> Result<Self> {
        let mut parts = text.split(TIMESTAMP_DELIMITER);
        let (body, ts) = match (parts.next(), parts.next(), parts.next()) {
            (Some(body), Some(ts), None) => (body, ts),
            (_, None, _) => {
                return Err(TubetalkError::MalformedResponse(
                    "answer has no timestamp".to_string(),
                ))
            }
            _ => {
                return Err(TubetalkError::MalformedResponse(
                    "answer has more than one timestamp".to_string(),
                ))
            }
        };

        let timestamp: f64 = ts.trim().parse().map_err(|_| {
            TubetalkError::MalformedResponse(format!("invalid timestamp: {:?}", ts.trim()))
        })?;

        Self::validated(vec![body.to_string()], timestamp)
    }

    /// Points are kept verbatim; only an answer whose every point is blank is rejected.
    fn validated(points: Vec<String>, timestamp: f64) -> Result<Self> {
        if points.iter().all(|p| p.trim().is_empty()) {
            return Err(TubetalkError::MalformedResponse(
                "answer is empty".to_string(),
            ));
        }
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(TubetalkError::MalformedResponse(format!(
                "invalid timestamp: {}",
                timestamp
            )));
        }

        Ok(Self { points, timestamp })
    }

    /// Answer points joined by a single space.
    pub fn text(&self) -> String {
        self.points.join(" ")
    }

    /// `<points>\nTimestamp: <seconds>`, the persisted message form.
    pub fn render(&self) -> String {
        format!("{}{}{}", self.text(), TIMESTAMP_DELIMITER, format_seconds(self.timestamp))
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_answer() {
        let answer = Answer::parse(r#"{"answer": ["intro"], "timestamp": 0.0}"#).unwrap();
        assert_eq!(answer, Answer::new(vec!["intro".to_string()], 0.0));
        assert_eq!(answer.render(), "intro\nTimestamp: 0.0");
    }

    #[test]
    fn test_parse_accepts_variants() {
        let answer =
            Answer::parse("```json\n{\"answer\": \"one line\", \"timestamps\": 12}\n```").unwrap();
        assert_eq!(answer.points, vec!["one line"]);
        assert_eq!(answer.render(), "one line\nTimestamp: 12.0");

        let answer = Answer::parse(r#"{"answer": ["First.", "Second."], "timestamp": 64.5}"#).unwrap();
        assert_eq!(answer.render(), "First. Second.\nTimestamp: 64.5");
    }

    #[test]
    fn test_parse_delimited_answer() {
        let answer = Answer::parse("Graphs have edges.\nTimestamp: 125.5").unwrap();
        assert_eq!(answer.timestamp, 125.5);
        assert_eq!(answer.text(), "Graphs have edges.");
    }

    #[test]
    fn test_delimiter_must_appear_once() {
        assert!(matches!(
            Answer::from_delimited("no timestamp here"),
            Err(TubetalkError::MalformedResponse(_))
        ));
        assert!(matches!(
            Answer::from_delimited("a\nTimestamp: 1.0\nTimestamp: 2.0"),
            Err(TubetalkError::MalformedResponse(_))
        ));
        assert!(Answer::from_delimited("a\nTimestamp: soon").is_err());
    }

    #[test]
    fn test_rejects_malformed_output() {
        assert!(Answer::parse("I don't know").is_err());
        assert!(Answer::parse(r#"{"answer": [], "timestamp": 1.0}"#).is_err());
        assert!(Answer::parse(r#"{"answer": ["x"], "timestamp": -3}"#).is_err());
        assert!(Answer::parse(r#"{"answer": ["x"]}"#).is_err());
    }

    #[test]
    fn test_points_are_joined_verbatim() {
        let answer = Answer::parse(r#"{"answer": ["a ", "", "b"], "timestamp": 3.0}"#).unwrap();
        assert_eq!(answer.points.len(), 3);
        assert_eq!(answer.render(), "a   b\nTimestamp: 3.0");

        assert!(Answer::parse(r#"{"answer": [" ", ""], "timestamp": 3.0}"#).is_err());
    }

    #[test]
    fn test_render_roundtrips_through_delimited() {
        let answer = Answer::new(vec!["Trees are graphs.".to_string()], 42.0);
        assert_eq!(Answer::from_delimited(&answer.render()).unwrap(), answer);
    }
}
