//! Workflow orchestration and feedback aggregation for studyloop.
//!
//! This crate ties the capability boundaries (byte source, extractor,
//! content generator, knowledge workspace) into the end-to-end task
//! pipeline, and accumulates per-task feedback into a strategy note.

pub mod agent;
pub mod feedback;
pub mod progress;

pub use agent::{BatchReport, LearningAgent, TaskOutcome, TaskRecord, task_properties};
pub use feedback::FeedbackLog;
pub use progress::{Progress, SilentProgress};
