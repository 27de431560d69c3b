//! Byte-source capability: reading raw content for a document reference.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use tracing::debug;

use studyloop_shared::{DocumentRef, Result, StudyLoopError};

/// Reads raw bytes for a logical document reference.
///
/// The orchestrator reads through this boundary once per document and
/// hands the bytes to the extractor.
pub trait ByteSource: Send + Sync {
    /// Read the full content of `doc`. Missing documents fail with an
    /// I/O-kind error.
    fn read(&self, doc: &DocumentRef) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

/// Byte source backed by the local filesystem; the reference is a path.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSource;

impl ByteSource for LocalFileSource {
    async fn read(&self, doc: &DocumentRef) -> Result<Vec<u8>> {
        let path = Path::new(doc.as_str());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StudyLoopError::io(path, e))?;
        debug!(doc = %doc, len = bytes.len(), "read document");
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

/// Deterministic byte source holding documents in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    docs: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under `reference`.
    pub fn insert(&mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.docs.insert(reference.into(), bytes.into());
    }
}

impl ByteSource for MemorySource {
    async fn read(&self, doc: &DocumentRef) -> Result<Vec<u8>> {
        self.docs.get(doc.as_str()).cloned().ok_or_else(|| {
            StudyLoopError::io(
                doc.as_str(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "document not registered"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_source_round_trip() {
        let mut source = MemorySource::new();
        source.insert("note-1", "Solve for x".as_bytes());

        let bytes = source
            .read(&DocumentRef::new("note-1"))
            .await
            .expect("registered doc");
        assert_eq!(bytes, b"Solve for x");
    }

    #[tokio::test]
    async fn memory_source_missing_doc_is_io_error() {
        let source = MemorySource::new();
        let err = source
            .read(&DocumentRef::new("nope"))
            .await
            .expect_err("unregistered doc");
        assert!(matches!(err, StudyLoopError::Io { .. }));
    }

    #[tokio::test]
    async fn local_source_reads_file() {
        let path = std::env::temp_dir().join("studyloop_source_test.txt");
        tokio::fs::write(&path, "A\nB").await.expect("write temp file");

        let bytes = LocalFileSource
            .read(&DocumentRef::new(path.to_string_lossy().to_string()))
            .await
            .expect("read temp file");
        assert_eq!(bytes, b"A\nB");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn local_source_missing_file_is_io_error() {
        let err = LocalFileSource
            .read(&DocumentRef::new("/nonexistent/studyloop-missing.txt"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, StudyLoopError::Io { .. }));
    }
}
