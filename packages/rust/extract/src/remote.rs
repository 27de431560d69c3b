//! HTTP client for a PaddleOCR-style structured recognition service.
//!
//! Posts raw capture bytes and maps the service's line list into the
//! same [`ExtractedText`] shape the built-in extractor produces.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use studyloop_shared::{DocumentRef, ExtractedText, Region, Result, StudyLoopError};

use crate::{EMPTY_CAPTURE_PLACEHOLDER, RecognizedLine, TextExtractor, assemble, synthetic_region};

/// User-Agent string for OCR requests.
const USER_AGENT: &str = concat!("studyloop/", env!("CARGO_PKG_VERSION"));

/// One line in the service response.
#[derive(Debug, Clone, Deserialize)]
struct ServiceLine {
    text: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
    /// Bounding box as `[x0, y0, x1, y1]`; synthesized when absent.
    #[serde(default, rename = "box")]
    bounds: Option<[u32; 4]>,
}

fn default_confidence() -> f32 {
    1.0
}

/// Service response: recognized lines in reading order.
#[derive(Debug, Clone, Deserialize)]
struct ServiceResponse {
    lines: Vec<ServiceLine>,
}

/// Extractor backed by a remote OCR service.
pub struct RemoteOcr {
    client: Client,
    endpoint: Url,
}

impl RemoteOcr {
    /// Build a client for the service at `endpoint`.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                StudyLoopError::extraction(format!("failed to build OCR client: {e}"))
            })?;

        Ok(Self { client, endpoint })
    }
}

impl TextExtractor for RemoteOcr {
    #[instrument(skip_all, fields(doc = %doc, endpoint = %self.endpoint))]
    async fn extract(&self, doc: &DocumentRef, bytes: &[u8]) -> Result<ExtractedText> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| StudyLoopError::extraction(format!("OCR request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudyLoopError::extraction(format!(
                "OCR service returned HTTP {status}"
            )));
        }

        let parsed: ServiceResponse = response
            .json()
            .await
            .map_err(|e| StudyLoopError::extraction(format!("malformed OCR response: {e}")))?;

        let lines = recognized_lines(parsed);
        debug!(lines = lines.len(), "OCR service response mapped");
        Ok(assemble(doc, bytes, lines))
    }
}

/// Map the service response into recognized lines, applying the same
/// sanitization as the built-in extractor: blank lines dropped, the
/// fixed placeholder substituted when nothing usable remains.
fn recognized_lines(response: ServiceResponse) -> Vec<RecognizedLine> {
    let lines: Vec<RecognizedLine> = response
        .lines
        .into_iter()
        .filter(|l| !l.text.trim().is_empty())
        .enumerate()
        .map(|(i, l)| RecognizedLine {
            text: l.text.trim().to_string(),
            confidence: l.confidence,
            region: match l.bounds {
                Some([x0, y0, x1, y1]) => Region { x0, y0, x1, y1 },
                None => synthetic_region(i),
            },
        })
        .collect();

    if lines.is_empty() {
        vec![RecognizedLine::synthetic(EMPTY_CAPTURE_PLACEHOLDER, 0)]
    } else {
        lines
    }
}
