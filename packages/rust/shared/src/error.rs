//! Error types for studyloop.
//!
//! Library crates use [`StudyLoopError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all studyloop operations.
#[derive(Debug, thiserror::Error)]
pub enum StudyLoopError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error (document unreadable, config unwritable).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Text extraction / OCR error (undecodable bytes, service failure).
    #[error("extraction error: {message}")]
    Extraction { message: String },

    /// Content generation error.
    #[error("generation error: {0}")]
    Generation(String),

    /// Knowledge workspace error (page create/update/comment failure).
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Data validation error (priority range, malformed payloads, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StudyLoopError>;

impl StudyLoopError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
