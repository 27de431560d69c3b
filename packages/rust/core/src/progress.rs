//! Progress callback for reporting pipeline status.

use crate::agent::{BatchReport, TaskOutcome};

/// Progress callback for reporting task-loop status.
pub trait Progress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a task begins executing.
    fn task_started(&self, task_id: &str, current: usize, total: usize);
    /// Called when a task settles (succeeded or failed).
    fn task_finished(&self, task_id: &str, outcome: &TaskOutcome);
    /// Called when the batch completes.
    fn done(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn task_started(&self, _task_id: &str, _current: usize, _total: usize) {}
    fn task_finished(&self, _task_id: &str, _outcome: &TaskOutcome) {}
    fn done(&self, _report: &BatchReport) {}
}
