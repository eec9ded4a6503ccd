use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::categorizer::{categorize_once, CategoryService, RetryPolicy};
use crate::course::CategoryUpdate;
use crate::store::{fetch_all, CourseStore};

use super::config::PipelineConfig;
use super::context::RunContext;
use super::control::RunController;
use super::error::PipelineError;
use super::progress::ProgressReporter;
use super::stats::{CategorizationOutcome, RunResult};

/// Lock shared by every pass that writes categories.
pub const RUN_LOCK: &str = "categorization";

/// Failure recorded for records with nothing to send.
pub const NO_CONTENT_MESSAGE: &str = "No content available for analysis";

const ALREADY_CATEGORIZED: &str = "Already categorized";

pub struct Pipeline {
    pub(super) store: Arc<dyn CourseStore>,
    pub(super) service: Arc<dyn CategoryService>,
    pub(super) config: Arc<PipelineConfig>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn CourseStore>,
        service: Arc<dyn CategoryService>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            store,
            service,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs a categorization pass with the configured retry policy.
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunResult, PipelineError> {
        self.run_categorization(progress, &self.config.retry, &RunController::new())
            .await
    }

    /// Categorizes every uncategorized record, one remote call at a time.
    ///
    /// Per-record failures are counted and never abort the run. Store
    /// failures propagate. The run lock is released on every exit path.
    pub async fn run_categorization(
        &self,
        progress: &dyn ProgressReporter,
        retry: &RetryPolicy,
        controller: &RunController,
    ) -> Result<RunResult, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("categorization_run", run_id = %run_id);

        async {
            self.acquire_run_lock(&run_id).await?;
            let result = self
                .categorize_all(&run_id, progress, retry, controller)
                .await;
            self.release_run_lock(&run_id).await;

            if let Ok(summary) = &result {
                info!(
                    processed = summary.processed,
                    categorized = summary.categorized,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    elapsed_ms = summary.elapsed_ms,
                    success = summary.success,
                    cancelled = summary.cancelled,
                    "Categorization run finished"
                );
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn categorize_all(
        &self,
        run_id: &str,
        progress: &dyn ProgressReporter,
        retry: &RetryPolicy,
        controller: &RunController,
    ) -> Result<RunResult, PipelineError> {
        let records = fetch_all(self.store.as_ref(), self.config.page_size).await?;
        if records.is_empty() {
            info!("No course records found");
            return Ok(RunResult::empty(0));
        }

        info!(total = records.len(), "Starting categorization");
        let mut ctx = RunContext::new(run_id, records.len());
        progress.report(ctx.snapshot(None, false));

        let last_index = records.len() - 1;
        for (index, record) in records.iter().enumerate() {
            if controller.is_cancelled() {
                info!(processed = ctx.stats.processed, "Run cancelled");
                ctx.cancelled = true;
                break;
            }

            if record.is_categorized() {
                ctx.stats.record(
                    &record.id,
                    &CategorizationOutcome::Skipped {
                        reason: ALREADY_CATEGORIZED.to_string(),
                    },
                );
                continue;
            }

            let payload = record.content();
            if payload.is_empty() {
                debug!(record_id = %record.id, "Record has no content");
                ctx.stats.record(
                    &record.id,
                    &CategorizationOutcome::Failure {
                        reason: NO_CONTENT_MESSAGE.to_string(),
                    },
                );
                continue;
            }

            let outcome = match categorize_once(self.service.as_ref(), &payload, retry).await {
                Ok(categorization) => {
                    ctx.pending.stage(CategoryUpdate::Generated {
                        record_id: record.id.clone(),
                        category: categorization.category.clone(),
                        confidence: categorization.confidence.clone(),
                        version: self.config.category_version.clone(),
                    });
                    CategorizationOutcome::Success {
                        category: categorization.category,
                        confidence: categorization.confidence,
                    }
                }
                Err(e) => {
                    warn!(record_id = %record.id, error = %e, "Failed to categorize record");
                    CategorizationOutcome::Failure {
                        reason: e.to_string(),
                    }
                }
            };
            ctx.stats.record(&record.id, &outcome);

            let interval = self.config.progress_interval.max(1);
            if ctx.stats.processed % interval == 0 {
                self.renew_run_lock(run_id).await?;
                progress.report(ctx.snapshot(Some(record.label()), false));
            }

            if ctx.pending.len() >= self.config.batch_size {
                self.commit(&mut ctx).await?;
            }

            if index < last_index && !self.config.rate_limit_delay.is_zero() {
                tokio::time::sleep(self.config.rate_limit_delay).await;
            }
        }

        if !ctx.pending.is_empty() {
            self.commit(&mut ctx).await?;
        }

        progress.report(ctx.snapshot(None, true));
        Ok(ctx.into_result(self.config.success_threshold))
    }

    /// Commits the staged batch. The lease is renewed first so a run that
    /// lost its lock never writes.
    async fn commit(&self, ctx: &mut RunContext) -> Result<(), PipelineError> {
        self.renew_run_lock(&ctx.run_id).await?;
        let batch = ctx.pending.take();
        let size = batch.len();
        self.store.commit(batch).await?;
        debug!(size, processed = ctx.stats.processed, "Committed category batch");
        Ok(())
    }

    pub(super) async fn acquire_run_lock(&self, owner: &str) -> Result<(), PipelineError> {
        let acquired = self
            .store
            .try_acquire_lock(RUN_LOCK, owner, self.config.lock_ttl)
            .await?;
        if !acquired {
            warn!(lock = RUN_LOCK, "Run lock is held by another run");
            return Err(PipelineError::RunInProgress {
                lock: RUN_LOCK.to_string(),
            });
        }
        Ok(())
    }

    /// Extends the run lock. Fails with `RunInProgress` once another run
    /// has taken the lock over.
    pub(super) async fn renew_run_lock(&self, owner: &str) -> Result<(), PipelineError> {
        let held = self
            .store
            .renew_lock(RUN_LOCK, owner, self.config.lock_ttl)
            .await?;
        if !held {
            warn!(lock = RUN_LOCK, "Run lock was lost, aborting");
            return Err(PipelineError::RunInProgress {
                lock: RUN_LOCK.to_string(),
            });
        }
        Ok(())
    }

    pub(super) async fn release_run_lock(&self, owner: &str) {
        if let Err(e) = self.store.release_lock(RUN_LOCK, owner).await {
            warn!(lock = RUN_LOCK, error = %e, "Failed to release run lock");
        }
    }
}
