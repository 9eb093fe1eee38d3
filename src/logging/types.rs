//! Core logging types: step entries, status, and the [`Log`] trait.
use super::utils::percent;

/// Step execution result for summary reporting.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Human-readable step name.
    pub name: String,
    /// Final status of the step.
    pub status: TaskStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Step completed successfully.
    Ok,
    /// Step does not apply to the current platform or was disabled by a flag.
    NotApplicable,
    /// Step ran but had nothing to do (e.g. tool not found, empty list).
    Skipped,
    /// Step encountered an error and could not complete.
    Failed,
}

/// Abstraction over logging backends.
///
/// Step and resource code logs through this trait so tests can inject a
/// logger without a global tracing subscriber.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a step result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);

    /// Log a stage header prefixed with the pipeline position and the share
    /// of steps already finished, e.g. `[3/8  25%] Add scoop buckets`.
    fn progress(&self, index: usize, total: usize, name: &str) {
        let done = index.saturating_sub(1);
        self.stage(&format!("[{index}/{total} {:>3}%] {name}", percent(done, total)));
    }
}
