//! Dry-run categorization over a small sample. Writes nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::categorizer::{categorize_once, RetryPolicy};

use super::error::PipelineError;
use super::runner::Pipeline;

/// Shown when a record has no category yet.
pub const MISSING_CATEGORY: &str = "MISSING";
/// Shown when the service returned no usable suggestion.
pub const UNDETERMINED_CATEGORY: &str = "COULD_NOT_DETERMINE";

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewItem {
    pub record_id: String,
    pub label: String,
    pub current_category: String,
    pub suggested_category: String,
    pub needs_update: bool,
    pub truncated_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
}

impl Pipeline {
    /// Suggests categories for up to `sample_size` records with content.
    ///
    /// Reads at most twice the sample, makes a single attempt per record and
    /// waits the preview delay between calls.
    pub async fn preview_categorization(
        &self,
        sample_size: usize,
    ) -> Result<Vec<PreviewItem>, PipelineError> {
        let records = self
            .store
            .fetch_limited(sample_size.saturating_mul(2))
            .await?;
        let sample: Vec<_> = records
            .iter()
            .filter(|r| !r.content().is_empty())
            .take(sample_size)
            .collect();
        info!(
            fetched = records.len(),
            sampled = sample.len(),
            "Previewing categorization"
        );

        let policy = RetryPolicy::single_attempt();
        let mut items = Vec::with_capacity(sample.len());
        for (index, record) in sample.iter().enumerate() {
            if index > 0 && !self.config.preview_delay.is_zero() {
                tokio::time::sleep(self.config.preview_delay).await;
            }

            let payload = record.content();
            let suggestion = match categorize_once(self.service.as_ref(), &payload, &policy).await
            {
                Ok(categorization) => Some(categorization),
                Err(e) => {
                    debug!(record_id = %record.id, error = %e, "No preview suggestion");
                    None
                }
            };

            let current = record.current_category();
            let needs_update = match (&suggestion, current) {
                (Some(s), Some(current)) => s.category != current,
                (Some(_), None) => true,
                (None, _) => false,
            };

            items.push(PreviewItem {
                record_id: record.id.clone(),
                label: record.label(),
                current_category: current.unwrap_or(MISSING_CATEGORY).to_string(),
                suggested_category: suggestion
                    .as_ref()
                    .map(|s| s.category.clone())
                    .unwrap_or_else(|| UNDETERMINED_CATEGORY.to_string()),
                needs_update,
                truncated_description: truncate_description(&payload.description),
                confidence: suggestion.map(|s| s.confidence),
            });
        }

        Ok(items)
    }
}

/// Cuts `text` to its first 100 characters followed by "...".
pub fn truncate_description(text: &str) -> String {
    match text.char_indices().nth(DESCRIPTION_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
