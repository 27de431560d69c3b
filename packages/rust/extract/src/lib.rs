//! Structured text extraction for captured study documents.
//!
//! This crate provides:
//! - [`source`] — the [`ByteSource`] capability (local filesystem + in-memory)
//! - [`TextExtractor`] — the extraction capability
//! - [`LineExtractor`] — deterministic line-based extractor
//! - [`remote`] — [`RemoteOcr`], an HTTP client for a PaddleOCR-style service
//!
//! Every extractor produces the same [`ExtractedText`] shape: sanitized
//! plain text (never empty), a markdown rendering, a tabular rendering,
//! and one classified [`TextSpan`] per line.

pub mod remote;
pub mod source;

use std::future::Future;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

use studyloop_shared::{
    DocumentRef, ExtractedText, Region, Result, SpanClass, SpanSource, TextSpan,
};

pub use remote::RemoteOcr;
pub use source::{ByteSource, LocalFileSource, MemorySource};

/// Fixed text substituted when a capture yields no usable text after
/// trimming, so downstream consumers never observe an empty document.
pub const EMPTY_CAPTURE_PLACEHOLDER: &str = "Sample prompt: 1 + 1 = ?";

/// Confidence reported by the built-in extractor. Stands in for a real
/// recognition score until a recognition backend supplies one.
const LINE_CONFIDENCE: f32 = 0.95;

// Synthetic line geometry: full-width rows at a fixed pitch.
const LINE_WIDTH: u32 = 500;
const LINE_PITCH: u32 = 20;
const LINE_HEIGHT: u32 = 18;

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Produces a structured extraction from raw document bytes.
pub trait TextExtractor: Send + Sync {
    /// Extract `bytes` captured from `doc`.
    ///
    /// Deterministic for identical bytes, except for the capture
    /// timestamp in span provenance. Never returns an empty-span result.
    fn extract(
        &self,
        doc: &DocumentRef,
        bytes: &[u8],
    ) -> impl Future<Output = Result<ExtractedText>> + Send;
}

// ---------------------------------------------------------------------------
// Recognized lines → ExtractedText
// ---------------------------------------------------------------------------

/// One recognized line, before assembly into an [`ExtractedText`].
#[derive(Debug, Clone)]
pub struct RecognizedLine {
    pub text: String,
    pub confidence: f32,
    pub region: Region,
}

impl RecognizedLine {
    /// A line with the built-in confidence and synthetic geometry for
    /// row `index`.
    pub fn synthetic(text: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            confidence: LINE_CONFIDENCE,
            region: synthetic_region(index),
        }
    }
}

/// Synthetic bounding region for the line at `index`.
pub fn synthetic_region(index: usize) -> Region {
    let top = index as u32 * LINE_PITCH;
    Region {
        x0: 0,
        y0: top,
        x1: LINE_WIDTH,
        y1: top + LINE_HEIGHT,
    }
}

/// Assemble the canonical multi-format result from recognized lines.
///
/// The first line is classified as the question, all later lines as
/// analysis. Callers must pass at least one line; extractors substitute
/// [`EMPTY_CAPTURE_PLACEHOLDER`] before calling this.
pub fn assemble(doc: &DocumentRef, bytes: &[u8], lines: Vec<RecognizedLine>) -> ExtractedText {
    debug_assert!(!lines.is_empty(), "extractors substitute a placeholder line");
    let captured_at = Utc::now();

    let plain_text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let markdown = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                format!("**{}**", l.text)
            } else {
                format!("- {}", l.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let table = lines
        .iter()
        .enumerate()
        .map(|(i, l)| [(i + 1).to_string(), l.text.clone()])
        .collect();

    let spans = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| TextSpan {
            line_id: format!("line-{i}"),
            text: line.text,
            confidence: line.confidence,
            region: line.region,
            class: if i == 0 {
                SpanClass::Question
            } else {
                SpanClass::Analysis
            },
            source: SpanSource {
                page: "1".into(),
                captured_at,
            },
        })
        .collect();

    ExtractedText {
        source: doc.clone(),
        plain_text,
        markdown,
        table,
        spans,
        content_hash: hash_bytes(bytes),
    }
}

/// SHA-256 of the source bytes, hex-encoded.
fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Built-in line extractor
// ---------------------------------------------------------------------------

/// Deterministic extractor that decodes bytes as UTF-8 text and treats
/// each non-empty line as one recognized span.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineExtractor;

impl TextExtractor for LineExtractor {
    async fn extract(&self, doc: &DocumentRef, bytes: &[u8]) -> Result<ExtractedText> {
        let decoded = String::from_utf8_lossy(bytes);

        let lines: Vec<RecognizedLine> = decoded
            .trim()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
            .map(|(i, l)| RecognizedLine::synthetic(l, i))
            .collect();

        let lines = if lines.is_empty() {
            vec![RecognizedLine::synthetic(EMPTY_CAPTURE_PLACEHOLDER, 0)]
        } else {
            lines
        };

        debug!(doc = %doc, lines = lines.len(), "assembled extraction");
        Ok(assemble(doc, bytes, lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentRef {
        DocumentRef::new("samples/demo-note.txt")
    }

    async fn extract(input: &str) -> ExtractedText {
        LineExtractor
            .extract(&doc(), input.as_bytes())
            .await
            .expect("line extraction cannot fail")
    }

    #[tokio::test]
    async fn three_lines_produce_three_spans() {
        let result = extract("A\nB\nC").await;

        assert_eq!(result.plain_text, "A\nB\nC");
        assert_eq!(result.markdown, "**A**\n- B\n- C");
        assert_eq!(
            result.table,
            vec![
                ["1".to_string(), "A".to_string()],
                ["2".to_string(), "B".to_string()],
                ["3".to_string(), "C".to_string()],
            ]
        );
        assert_eq!(result.spans.len(), 3);
        assert_eq!(result.spans[0].class, SpanClass::Question);
        assert_eq!(result.spans[1].class, SpanClass::Analysis);
        assert_eq!(result.spans[2].class, SpanClass::Analysis);
    }

    #[tokio::test]
    async fn empty_input_substitutes_placeholder() {
        for input in ["", "   \n\t\n  "] {
            let result = extract(input).await;
            assert_eq!(result.plain_text, EMPTY_CAPTURE_PLACEHOLDER);
            assert_eq!(result.spans.len(), 1);
            assert_eq!(result.spans[0].text, EMPTY_CAPTURE_PLACEHOLDER);
            assert_eq!(result.spans[0].class, SpanClass::Question);
        }
    }

    #[tokio::test]
    async fn crlf_line_endings_are_handled() {
        let result = extract("A\r\nB\r\nC").await;
        assert_eq!(result.plain_text, "A\nB\nC");
        assert_eq!(result.spans.len(), 3);
    }

    #[tokio::test]
    async fn blank_interior_lines_are_dropped() {
        let result = extract("A\n\nB").await;
        assert_eq!(result.spans.len(), 2);
        assert_eq!(result.plain_text, "A\nB");
    }

    #[tokio::test]
    async fn spans_carry_synthetic_geometry_and_ids() {
        let result = extract("A\nB").await;

        assert_eq!(result.spans[0].line_id, "line-0");
        assert_eq!(result.spans[1].line_id, "line-1");
        assert_eq!(
            result.spans[1].region,
            Region {
                x0: 0,
                y0: 20,
                x1: 500,
                y1: 38
            }
        );
        assert!(result.spans.iter().all(|s| s.confidence == 0.95));
        assert!(result.spans.iter().all(|s| s.source.page == "1"));
    }

    #[tokio::test]
    async fn deterministic_apart_from_capture_time() {
        let a = extract("A\nB\nC").await;
        let b = extract("A\nB\nC").await;

        assert_eq!(a.plain_text, b.plain_text);
        assert_eq!(a.markdown, b.markdown);
        assert_eq!(a.table, b.table);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.spans.len(), b.spans.len());
        for (sa, sb) in a.spans.iter().zip(&b.spans) {
            assert_eq!(sa.line_id, sb.line_id);
            assert_eq!(sa.text, sb.text);
            assert_eq!(sa.region, sb.region);
            assert_eq!(sa.class, sb.class);
        }
    }

    #[tokio::test]
    async fn content_hash_tracks_source_bytes() {
        let a = extract("A").await;
        let b = extract("B").await;
        assert_ne!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }
}
