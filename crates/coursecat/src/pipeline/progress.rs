use serde::{Deserialize, Serialize};

/// Point-in-time view of a categorization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub run_id: String,
    pub total: usize,
    pub processed: usize,
    pub categorized: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_millis_remaining: Option<u64>,
    /// Set on the last snapshot of a run.
    #[serde(default)]
    pub finished: bool,
}

/// Receives snapshots at run start, every N processed records and at the end.
///
/// Called from the run loop, so implementations must return promptly.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, snapshot: ProgressSnapshot);
}

/// No-op reporter for unit tests and headless runs.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _snapshot: ProgressSnapshot) {}
}

/// Adapts a closure into a reporter.
pub struct FnProgress<F>(pub F);

impl<F> ProgressReporter for FnProgress<F>
where
    F: Fn(ProgressSnapshot) + Send + Sync,
{
    fn report(&self, snapshot: ProgressSnapshot) {
        (self.0)(snapshot)
    }
}
