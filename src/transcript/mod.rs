//! Transcript fetching for TubeTalk.
//!
//! Captions are fetched once per video and kept as a structured segment list.

mod models;
mod youtube;

pub use models::{
    format_seconds, format_timestamp, parse_flattened, FlattenedTranscript, Transcript,
    TranscriptSegment,
};
pub use youtube::{embed_url, embed_url_at, extract_video_id, watch_url_at, YoutubeTranscriptFetcher};

use crate::error::{Result, TubetalkError};
use async_trait::async_trait;

/// Trait for caption providers.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the transcript of a video by ID.
    async fn fetch(&self, video_id: &str) -> Result<Transcript>;
}

/// Extract the video ID from `url` and fetch its transcript.
pub async fn load_transcript(fetcher: &dyn TranscriptFetcher, url: &str) -> Result<Transcript> {
    let video_id = extract_video_id(url).ok_or_else(|| TubetalkError::InvalidUrl(url.to_string()))?;
    fetcher.fetch(&video_id).await
}
