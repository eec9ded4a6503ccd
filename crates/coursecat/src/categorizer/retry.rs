//! Bounded exponential backoff around one categorization call.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CategorizeError, Categorization, CategoryService};
use crate::course::ContentPayload;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn single_attempt() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before attempt number `attempt` (0-based). The first attempt
    /// is never delayed.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let raw = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = if self.base_delay_ms == 0 {
            Some("base_delay_ms must be positive".to_string())
        } else if self.max_delay_ms == 0 {
            Some("max_delay_ms must be positive".to_string())
        } else if self.backoff_multiplier.is_nan() || self.backoff_multiplier <= 0.0 {
            Some(format!(
                "backoff_multiplier must be positive, got {}",
                self.backoff_multiplier
            ))
        } else if self.max_delay_ms < self.base_delay_ms {
            Some(format!(
                "max_delay_ms ({}) is below base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ConfigError::InvalidRetryPolicy { reason }),
            None => Ok(()),
        }
    }
}

/// Calls `service` up to `max_retries + 1` times.
///
/// Returns the first success. Non-retryable errors are returned at once;
/// otherwise the last error is returned when attempts run out.
pub async fn categorize_once(
    service: &dyn CategoryService,
    payload: &ContentPayload,
    policy: &RetryPolicy,
) -> Result<Categorization, CategorizeError> {
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.delay_before(attempt);
            debug!(
                attempt = attempt + 1,
                max_attempts = policy.max_retries + 1,
                delay_ms = delay.as_millis() as u64,
                "Retrying categorization"
            );
            tokio::time::sleep(delay).await;
        }

        match service.categorize(payload).await {
            Ok(categorization) => return Ok(categorization),
            Err(e) => {
                if e.is_retryable() && attempt < policy.max_retries {
                    warn!(attempt = attempt + 1, error = %e, "Categorization attempt failed");
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    Err(last_error.unwrap_or(CategorizeError::Request(
        "Categorization failed after all retries".to_string(),
    )))
}
