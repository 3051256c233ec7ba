//! Fixed-size character window chunking.

use super::{ChunkingConfig, ContentChunk};
use crate::transcript::Transcript;
use tracing::debug;

/// A window over a string, in character offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct TextWindow {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Split `text` into windows of `chunk_size` characters, each starting
/// `chunk_size - chunk_overlap` characters after the previous one.
///
/// The last window always ends at the end of the text.
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<TextWindow> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut windows = Vec::with_capacity(config.expected_chunks(len));

    if len == 0 || config.chunk_size == 0 {
        return windows;
    }

    let stride = config.stride();
    let mut start = 0usize;

    loop {
        let end = (start + config.chunk_size).min(len);
        windows.push(TextWindow {
            start,
            end,
            text: chars[start..end].iter().collect(),
        });

        if end == len {
            break;
        }
        start += stride;
    }

    windows
}

/// Chunks a transcript's flattened text and tags each window with the
/// time range of the captions it overlaps.
#[derive(Debug, Clone, Default)]
pub struct WindowChunker {
    config: ChunkingConfig,
}

impl WindowChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split a transcript into content chunks.
    pub fn chunk(&self, transcript: &Transcript) -> Vec<ContentChunk> {
        let flattened = transcript.flatten_with_spans();
        let windows = split_text(&flattened.text, &self.config);

        let chunks: Vec<ContentChunk> = windows
            .into_iter()
            .enumerate()
            .map(|(order, window)| {
                let touched: Vec<usize> = flattened
                    .spans
                    .iter()
                    .enumerate()
                    .filter(|(_, span)| span.start < window.end && span.end > window.start)
                    .map(|(i, _)| i)
                    .collect();

                let start_seconds = touched
                    .first()
                    .map(|&i| transcript.segments[i].start_seconds)
                    .unwrap_or(0.0);
                let end_seconds = touched
                    .last()
                    .map(|&i| transcript.segments[i].end_seconds())
                    .unwrap_or(start_seconds);

                ContentChunk {
                    content: window.text,
                    start_seconds,
                    end_seconds,
                    order: order as i32,
                    char_start: window.start,
                    char_end: window.end,
                }
            })
            .collect();

        debug!("Split transcript {} into {} chunks", transcript.video_id, chunks.len());
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptSegment;

    fn text_of_len(n: usize) -> String {
        "abcdefghij".chars().cycle().take(n).collect()
    }

    #[test]
    fn test_chunk_count_matches_window_formula() {
        let config = ChunkingConfig::default();

        for n in [1, 999, 1000, 1001, 1800, 1801, 2600, 5000, 12_345] {
            let windows = split_text(&text_of_len(n), &config);
            let expected = if n <= 1000 { 1 } else { (n - 200).div_ceil(800) };
            assert_eq!(windows.len(), expected, "length {}", n);
            assert_eq!(config.expected_chunks(n), expected);
        }
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_text("", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_windows_overlap_and_cover_text() {
        let config = ChunkingConfig::default();
        let text = text_of_len(2000);
        let windows = split_text(&text, &config);

        assert_eq!(windows[0].start, 0);
        assert_eq!(windows[0].end, 1000);
        assert_eq!(windows[1].start, 800);
        assert_eq!(windows.last().map(|w| w.end), Some(2000));

        let overlap_a: String = windows[0].text.chars().skip(800).collect();
        let overlap_b: String = windows[1].text.chars().take(200).collect();
        assert_eq!(overlap_a, overlap_b);
    }

    #[test]
    fn test_multibyte_text_splits_on_characters() {
        let config = ChunkingConfig {
            chunk_size: 4,
            chunk_overlap: 1,
        };
        let windows = split_text("नमस्ते दुनिया", &config);
        assert!(windows.iter().all(|w| w.text.chars().count() <= 4));
    }

    #[test]
    fn test_chunks_carry_caption_times() {
        let segments: Vec<TranscriptSegment> = (0..60)
            .map(|i| {
                TranscriptSegment::new(
                    format!("caption number {} talks about graphs", i),
                    i as f64 * 2.0,
                    2.0,
                )
            })
            .collect();
        let transcript = Transcript::new("abc12345678", segments);

        let chunker = WindowChunker::new(ChunkingConfig::default());
        let chunks = chunker.chunk(&transcript);

        let flat_len = transcript.flatten().chars().count();
        assert_eq!(chunks.len(), ChunkingConfig::default().expected_chunks(flat_len));
        assert_eq!(chunks[0].start_seconds, 0.0);
        assert!(chunks[1].start_seconds > 0.0);
        assert!(chunks.windows(2).all(|w| w[0].start_seconds <= w[1].start_seconds));
        assert_eq!(chunks.last().map(|c| c.end_seconds), Some(120.0));
    }
}
