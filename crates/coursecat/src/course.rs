//! Course records and the content that is sent for categorization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a record's current category came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// Assigned by the remote categorization service.
    #[serde(rename = "openai")]
    OpenAi,
    /// Rewritten by the category validation pass.
    ValidationFix,
    Unknown,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategorySource::OpenAi => "openai",
            CategorySource::ValidationFix => "validation_fix",
            CategorySource::Unknown => "unknown",
        }
    }

    /// Parses a stored source label. Unrecognized labels map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "openai" => CategorySource::OpenAi,
            "validation_fix" => CategorySource::ValidationFix,
            _ => CategorySource::Unknown,
        }
    }
}

impl std::fmt::Display for CategorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One course/quiz document.
///
/// Serde aliases accept the field names used by the LMS export
/// (`NewTitle`, `OriginalQuizTitle`, `CourseName`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    #[serde(default, alias = "NewTitle", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "OriginalQuizTitle",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_title: Option<String>,
    #[serde(
        default,
        alias = "NewDescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        alias = "OriginalQuizDescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_description: Option<String>,
    #[serde(default, alias = "CourseName", skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_source: Option<CategorySource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_generated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_fixed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_version: Option<String>,
}

impl CourseRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// The non-blank category label, if any.
    pub fn current_category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    /// A record with a non-blank category has already been processed.
    pub fn is_categorized(&self) -> bool {
        self.current_category().is_some()
    }

    /// Human-readable label for progress output.
    pub fn label(&self) -> String {
        non_blank(self.title.as_deref())
            .or_else(|| non_blank(self.original_title.as_deref()))
            .or_else(|| non_blank(self.course_name.as_deref()))
            .unwrap_or(self.id.as_str())
            .to_string()
    }

    pub fn content(&self) -> ContentPayload {
        resolve_content(self)
    }
}

/// The text fields sent to the categorization endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPayload {
    pub title: String,
    pub description: String,
    pub course_name: String,
}

impl ContentPayload {
    /// True when there is nothing to analyze.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.course_name.is_empty()
    }
}

/// Resolves the payload for a record.
///
/// Title: `title` → `original_title` → `course_name` → "".
/// Description: `description` → `original_description` → "".
/// Blank (whitespace-only) values count as absent; kept values are trimmed.
pub fn resolve_content(record: &CourseRecord) -> ContentPayload {
    let title = first_present(&[
        record.title.as_deref(),
        record.original_title.as_deref(),
        record.course_name.as_deref(),
    ]);
    let description = first_present(&[
        record.description.as_deref(),
        record.original_description.as_deref(),
    ]);
    let course_name = first_present(&[record.course_name.as_deref()]);

    ContentPayload {
        title,
        description,
        course_name,
    }
}

fn first_present(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .find_map(|c| non_blank(*c))
        .unwrap_or_default()
        .to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A staged change to one record's category fields.
///
/// Timestamps are not part of the update: the store stamps them at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryUpdate {
    /// A category produced by the remote service.
    Generated {
        record_id: String,
        category: String,
        confidence: String,
        version: String,
    },
    /// A category rewritten by the validation pass.
    Corrected { record_id: String, category: String },
}

/// Confidence written alongside validation corrections.
pub const CORRECTED_CONFIDENCE: &str = "corrected";

impl CategoryUpdate {
    pub fn record_id(&self) -> &str {
        match self {
            CategoryUpdate::Generated { record_id, .. } => record_id,
            CategoryUpdate::Corrected { record_id, .. } => record_id,
        }
    }

    pub fn source(&self) -> CategorySource {
        match self {
            CategoryUpdate::Generated { .. } => CategorySource::OpenAi,
            CategoryUpdate::Corrected { .. } => CategorySource::ValidationFix,
        }
    }
}
