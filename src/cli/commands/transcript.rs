//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, TranscriptFormat};
use crate::config::Settings;
use crate::transcript::{format_timestamp, load_transcript, Transcript, YoutubeTranscriptFetcher};
use anyhow::Result;

/// Fetch and print a transcript. Needs no API key or database.
pub async fn run_transcript(url: &str, format: TranscriptFormat, settings: Settings) -> Result<()> {
    preflight::check(Operation::Browse)?;

    let fetcher = YoutubeTranscriptFetcher::new(&settings.transcript)?;

    let spinner = Output::spinner("Fetching transcript...");
    let result = load_transcript(&fetcher, url).await;
    spinner.finish_and_clear();

    let transcript = match result {
        Ok(t) => t,
        Err(e) => {
            Output::warning(&e.to_string());
            return Err(e.into());
        }
    };

    println!("{}", render(&transcript, format)?);
    Ok(())
}

fn render(transcript: &Transcript, format: TranscriptFormat) -> Result<String> {
    Ok(match format {
        TranscriptFormat::Json => serde_json::to_string_pretty(transcript)?,
        TranscriptFormat::Flat => transcript.flatten(),
        TranscriptFormat::Text => transcript
            .segments
            .iter()
            .map(|s| format!("[{}] {}", format_timestamp(s.start_seconds), s.text))
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptSegment;

    #[test]
    fn test_render_formats() {
        let transcript = Transcript::new(
            "abc12345678",
            vec![
                TranscriptSegment::new("intro", 0.0, 3.0),
                TranscriptSegment::new("graphs", 65.5, 2.0),
            ],
        );

        assert_eq!(
            render(&transcript, TranscriptFormat::Text).unwrap(),
            "[00:00] intro\n[01:05] graphs"
        );
        assert_eq!(
            render(&transcript, TranscriptFormat::Flat).unwrap(),
            "intro (0.0) graphs (65.5)"
        );

        let json = render(&transcript, TranscriptFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["video_id"], "abc12345678");
        assert_eq!(value["segments"][1]["start_seconds"], 65.5);
    }
}
