use std::time::Duration;

use crate::categorizer::RetryPolicy;
use crate::config::Config;
use crate::error::ConfigError;

use super::validation::CategoryVocabulary;

/// Run settings resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    pub batch_size: usize,
    pub rate_limit_delay: Duration,
    pub progress_interval: usize,
    pub success_threshold: f64,
    pub page_size: usize,
    pub lock_ttl: Duration,
    pub category_version: String,
    pub preview_sample_size: usize,
    pub preview_delay: Duration,
    pub vocabulary: CategoryVocabulary,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let vocabulary = CategoryVocabulary::from_config(&config.validation)?;
        Ok(Self::with_vocabulary(config, vocabulary))
    }

    fn with_vocabulary(config: &Config, vocabulary: CategoryVocabulary) -> Self {
        Self {
            retry: config.retry.clone(),
            batch_size: config.run.batch_size,
            rate_limit_delay: Duration::from_millis(config.run.rate_limit_delay_ms),
            progress_interval: config.run.progress_interval,
            success_threshold: config.run.success_threshold,
            page_size: config.run.page_size,
            lock_ttl: Duration::from_secs(config.run.lock_ttl_secs),
            category_version: config.run.category_version.clone(),
            preview_sample_size: config.preview.sample_size,
            preview_delay: Duration::from_millis(config.preview.delay_ms),
            vocabulary,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_vocabulary(&Config::default(), CategoryVocabulary::default())
    }
}
