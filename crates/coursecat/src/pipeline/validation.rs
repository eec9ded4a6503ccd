//! Category validation: rewrites labels outside the allowed vocabulary.

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::schema::{ValidationConfig, DEFAULT_CATEGORIES, DEFAULT_FALLBACK_CATEGORY};
use crate::course::CategoryUpdate;
use crate::error::ConfigError;
use crate::store::{fetch_all, WriteBatch};

use super::error::PipelineError;
use super::runner::Pipeline;

/// Closed set of allowed category labels plus the fallback label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVocabulary {
    allowed: Vec<String>,
    default: String,
}

impl CategoryVocabulary {
    pub fn new(allowed: Vec<String>, default: impl Into<String>) -> Result<Self, ConfigError> {
        let default = default.into();
        if allowed.is_empty() {
            return Err(ConfigError::InvalidVocabulary {
                reason: "allowed category list is empty".to_string(),
            });
        }
        if let Some(blank) = allowed.iter().find(|c| c.trim().is_empty()) {
            return Err(ConfigError::InvalidVocabulary {
                reason: format!("blank category label {:?}", blank),
            });
        }
        if !allowed.contains(&default) {
            return Err(ConfigError::InvalidVocabulary {
                reason: format!("default category '{}' is not an allowed category", default),
            });
        }
        Ok(Self { allowed, default })
    }

    pub fn from_config(config: &ValidationConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.allowed_categories.clone(),
            config.default_category.clone(),
        )
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn default_category(&self) -> &str {
        &self.default
    }

    /// Exact membership.
    pub fn is_allowed(&self, label: &str) -> bool {
        self.allowed.iter().any(|c| c == label)
    }

    /// Maps a label onto the vocabulary.
    ///
    /// The first allowed label that contains `label`, or is contained in it,
    /// ignoring case, wins. Otherwise the default label is used.
    pub fn correct(&self, label: &str) -> &str {
        let needle = label.trim().to_lowercase();
        if needle.is_empty() {
            return &self.default;
        }
        self.allowed
            .iter()
            .find(|allowed| {
                let candidate = allowed.to_lowercase();
                needle.contains(&candidate) || candidate.contains(&needle)
            })
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

impl Default for CategoryVocabulary {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            default: DEFAULT_FALLBACK_CATEGORY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCorrection {
    pub record_id: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: usize,
    pub invalid: usize,
    pub fixed: usize,
    pub corrections: Vec<CategoryCorrection>,
}

impl Pipeline {
    /// Rewrites every category outside the vocabulary and commits all
    /// corrections at once. Running it twice changes nothing the second time.
    pub async fn validate_categories(&self) -> Result<ValidationReport, PipelineError> {
        let owner = Uuid::new_v4().to_string();
        let span = info_span!("category_validation", run_id = %owner);

        async {
            self.acquire_run_lock(&owner).await?;
            let result = self.repair_categories(&owner).await;
            self.release_run_lock(&owner).await;
            result
        }
        .instrument(span)
        .await
    }

    async fn repair_categories(&self, owner: &str) -> Result<ValidationReport, PipelineError> {
        let vocabulary = &self.config.vocabulary;
        let records = fetch_all(self.store.as_ref(), self.config.page_size).await?;

        let mut report = ValidationReport::default();
        let mut batch = WriteBatch::new();
        for record in &records {
            let Some(current) = record.current_category() else {
                continue;
            };
            if vocabulary.is_allowed(current) {
                report.valid += 1;
                continue;
            }

            report.invalid += 1;
            let corrected = vocabulary.correct(current);
            batch.stage(CategoryUpdate::Corrected {
                record_id: record.id.clone(),
                category: corrected.to_string(),
            });
            report.corrections.push(CategoryCorrection {
                record_id: record.id.clone(),
                from: current.to_string(),
                to: corrected.to_string(),
            });
        }

        if !batch.is_empty() {
            let size = batch.len();
            self.renew_run_lock(owner).await?;
            self.store.commit(batch).await?;
            report.fixed = size;
        }

        info!(
            valid = report.valid,
            invalid = report.invalid,
            fixed = report.fixed,
            "Category validation finished"
        );
        Ok(report)
    }
}
