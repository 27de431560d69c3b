//! Shared types, error model, and configuration for studyloop.
//!
//! This crate is the foundation depended on by all other studyloop crates.
//! It provides:
//! - [`StudyLoopError`] — the unified error type
//! - Domain types ([`LearnerProfile`], [`LearningTask`], [`ExtractedText`],
//!   [`AgentContext`], [`PageWrite`], [`FeedbackRecord`], [`StrategyNote`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, OcrConfig, PipelineConfig, PipelineSection, WorkspaceConfig,
    WriteOrder, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_workspace_token, workspace_token,
};
pub use error::{Result, StudyLoopError};
pub use types::{
    AgentContext, CompetencyLevel, DUE_UNSET, DocumentRef, ExtractedText, FeedbackRecord,
    KindStats, LearnerProfile, LearningTask, PageId, PageWrite, Priority, Properties,
    PropertyValue, Region, SpanClass, SpanSource, StrategyNote, TaskKind, TextSpan, Trend,
};
