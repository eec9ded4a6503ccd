use tokio::time::Instant;

use super::progress::ProgressSnapshot;
use super::stats::{RunResult, RunStatistics};
use crate::store::WriteBatch;

/// Mutable state of one categorization run.
pub struct RunContext {
    pub run_id: String,
    pub stats: RunStatistics,
    /// Updates staged since the last commit.
    pub pending: WriteBatch,
    pub cancelled: bool,
    started: Instant,
}

impl RunContext {
    pub fn new(run_id: &str, total: usize) -> Self {
        Self {
            run_id: run_id.to_string(),
            stats: RunStatistics::new(total),
            pending: WriteBatch::new(),
            cancelled: false,
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn snapshot(&self, current_item_label: Option<String>, finished: bool) -> ProgressSnapshot {
        ProgressSnapshot {
            run_id: self.run_id.clone(),
            total: self.stats.total,
            processed: self.stats.processed,
            categorized: self.stats.categorized,
            failed: self.stats.failed,
            skipped: self.stats.skipped,
            current_item_label,
            estimated_millis_remaining: self.stats.estimate_remaining_ms(self.elapsed_ms()),
            finished,
        }
    }

    pub fn into_result(self, success_threshold: f64) -> RunResult {
        let elapsed_ms = self.elapsed_ms();
        RunResult::from_stats(self.stats, elapsed_ms, success_threshold, self.cancelled)
    }
}
