//! YouTube caption fetching and URL helpers.

use super::{Transcript, TranscriptFetcher, TranscriptSegment};
use crate::config::TranscriptSettings;
use crate::error::{Result, TubetalkError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};
use url::Url;
use yt_transcript_rs::api::YouTubeTranscriptApi;

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("Invalid regex"))
}

fn bare_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("Invalid regex"))
}

/// Extract the 11-character video ID from a watch/share link or a bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if let Some(caps) = video_id_regex().captures(input) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    if bare_id_regex().is_match(input) {
        return Some(input.to_string());
    }

    None
}

/// Canonical embeddable player URL. Inputs without a video ID are returned unchanged.
pub fn embed_url(input: &str) -> String {
    match extract_video_id(input) {
        Some(id) => format!("https://www.youtube.com/embed/{}", id),
        None => input.to_string(),
    }
}

/// Embeddable player URL that starts playing at `seconds`.
pub fn embed_url_at(input: &str, seconds: f64) -> String {
    let base = embed_url(input);
    match Url::parse(&base) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("start", &whole_seconds(seconds).to_string())
                .append_pair("autoplay", "1");
            url.to_string()
        }
        Err(_) => base,
    }
}

/// Watch-page URL that jumps to `seconds`.
pub fn watch_url_at(input: &str, seconds: f64) -> Option<String> {
    let id = extract_video_id(input)?;
    let url = Url::parse_with_params(
        "https://www.youtube.com/watch",
        &[
            ("v", id),
            ("t", format!("{}s", whole_seconds(seconds))),
        ],
    )
    .ok()?;
    Some(url.to_string())
}

fn whole_seconds(seconds: f64) -> u64 {
    seconds.max(0.0) as u64
}

/// Fetches captions from YouTube.
pub struct YoutubeTranscriptFetcher {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
    preserve_formatting: bool,
}

impl YoutubeTranscriptFetcher {
    /// Create a fetcher without proxy or cookie authentication.
    pub fn new(settings: &TranscriptSettings) -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None).map_err(|e| {
            TubetalkError::TranscriptFetch(format!("Failed to initialize caption client: {}", e))
        })?;

        Ok(Self {
            api,
            languages: settings.languages.clone(),
            preserve_formatting: settings.preserve_formatting,
        })
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeTranscriptFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        let fetched = self
            .api
            .fetch_transcript(video_id, &languages, self.preserve_formatting)
            .await
            .map_err(|e| {
                warn!("Caption fetch failed for {}: {}", video_id, e);
                TubetalkError::TranscriptFetch(format!("{}: {}", video_id, e))
            })?;

        debug!(
            "Fetched {} captions ({}, generated: {})",
            fetched.snippets.len(),
            fetched.language_code,
            fetched.is_generated
        );

        let segments: Vec<TranscriptSegment> = fetched
            .snippets
            .iter()
            .map(|snippet| {
                TranscriptSegment::new(
                    normalize_caption(&snippet.text),
                    snippet.start,
                    snippet.duration,
                )
            })
            .filter(|segment| !segment.text.is_empty())
            .collect();

        if segments.is_empty() {
            return Err(TubetalkError::TranscriptFetch(format!(
                "{}: captions are empty",
                video_id
            )));
        }

        info!("Loaded transcript for {} ({} segments)", video_id, segments.len());
        Ok(Transcript::new(video_id, segments))
    }
}

/// Collapse caption line breaks and runs of whitespace into single spaces.
fn normalize_caption(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?feature=shared"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL1&v=abc12345678&t=3s"),
            Some("abc12345678".to_string())
        );
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));

        assert_eq!(extract_video_id("not a video"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_embed_urls() {
        assert_eq!(
            embed_url("https://www.youtube.com/watch?v=abc12345678"),
            "https://www.youtube.com/embed/abc12345678"
        );
        assert_eq!(embed_url("nothing here"), "nothing here");
        assert_eq!(
            embed_url_at("https://youtu.be/abc12345678", 42.9),
            "https://www.youtube.com/embed/abc12345678?start=42&autoplay=1"
        );
    }

    #[test]
    fn test_watch_url_at() {
        assert_eq!(
            watch_url_at("https://www.youtube.com/watch?v=abc12345678", 75.4).as_deref(),
            Some("https://www.youtube.com/watch?v=abc12345678&t=75s")
        );
        assert!(watch_url_at("nope", 1.0).is_none());
    }

    #[test]
    fn test_normalize_caption() {
        assert_eq!(normalize_caption("  hello\nworld  "), "hello world");
    }
}
