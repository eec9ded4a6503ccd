//! Run counters and the result returned to callers.

use serde::{Deserialize, Serialize};

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorizationOutcome {
    Success { category: String, confidence: String },
    Failure { reason: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordError {
    pub record_id: String,
    pub message: String,
}

/// Counters owned by a single run.
///
/// `processed == categorized + failed + skipped` holds after every call
/// to [`RunStatistics::record`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub total: usize,
    pub processed: usize,
    pub categorized: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<RecordError>,
}

impl RunStatistics {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, record_id: &str, outcome: &CategorizationOutcome) {
        self.processed += 1;
        match outcome {
            CategorizationOutcome::Success { .. } => self.categorized += 1,
            CategorizationOutcome::Skipped { .. } => self.skipped += 1,
            CategorizationOutcome::Failure { reason } => {
                self.failed += 1;
                self.errors.push(RecordError {
                    record_id: record_id.to_string(),
                    message: reason.clone(),
                });
            }
        }
    }

    /// Soft success signal: fewer failures than `threshold` of processed.
    /// A run that processed nothing is successful.
    pub fn is_success(&self, threshold: f64) -> bool {
        self.processed == 0 || (self.failed as f64) < self.processed as f64 * threshold
    }

    /// Remaining time extrapolated from the average time per record so far.
    pub fn estimate_remaining_ms(&self, elapsed_ms: u64) -> Option<u64> {
        if self.processed == 0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.processed) as u128;
        let estimate = remaining * u128::from(elapsed_ms) / self.processed as u128;
        Some(u64::try_from(estimate).unwrap_or(u64::MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub processed: usize,
    pub categorized: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<RecordError>,
    pub elapsed_ms: u64,
    pub success: bool,
    pub cancelled: bool,
}

impl RunResult {
    /// Result for a run over an empty collection.
    pub fn empty(elapsed_ms: u64) -> Self {
        Self::from_stats(RunStatistics::default(), elapsed_ms, 1.0, false)
    }

    pub fn from_stats(
        stats: RunStatistics,
        elapsed_ms: u64,
        threshold: f64,
        cancelled: bool,
    ) -> Self {
        let success = stats.is_success(threshold);
        Self {
            processed: stats.processed,
            categorized: stats.categorized,
            failed: stats.failed,
            skipped: stats.skipped,
            errors: stats.errors,
            elapsed_ms,
            success,
            cancelled,
        }
    }
}
