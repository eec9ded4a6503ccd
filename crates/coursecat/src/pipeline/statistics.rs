//! Collection-wide category statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::course::{CategorySource, CourseRecord};
use crate::store::fetch_all;

use super::error::PipelineError;
use super::runner::Pipeline;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatistics {
    pub total: usize,
    pub categorized: usize,
    pub uncategorized: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
}

/// Summarizes a set of records in one pass.
///
/// Categorized records without a source count under `unknown`.
pub fn summarize(records: &[CourseRecord]) -> CategoryStatistics {
    let mut stats = CategoryStatistics {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        let Some(category) = record.current_category() else {
            stats.uncategorized += 1;
            continue;
        };
        stats.categorized += 1;
        *stats.by_category.entry(category.to_string()).or_default() += 1;

        let source = record.category_source.unwrap_or(CategorySource::Unknown);
        *stats.by_source.entry(source.to_string()).or_default() += 1;
    }

    stats
}

impl Pipeline {
    /// Reads the whole collection and summarizes it. Writes nothing.
    pub async fn category_statistics(&self) -> Result<CategoryStatistics, PipelineError> {
        let records = fetch_all(self.store.as_ref(), self.config.page_size).await?;
        Ok(summarize(&records))
    }
}
