use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::categorizer::RetryPolicy;

/// The medical-education categories accepted by the validation pass.
pub const DEFAULT_CATEGORIES: [&str; 12] = [
    "Cardiology",
    "Pulmonology",
    "Gastroenterology",
    "Neurology",
    "Infectious Disease",
    "Endocrinology",
    "Nephrology",
    "Hematology/Oncology",
    "Pediatrics",
    "Surgery",
    "Emergency Medicine",
    "Medical Knowledge",
];

pub const DEFAULT_FALLBACK_CATEGORY: &str = "Medical Knowledge";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Defaults to `~/.coursecat/data/coursecat.db`. A leading `~/` is
    /// expanded to the home directory.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            endpoint: EndpointConfig::default(),
            retry: RetryPolicy::default(),
            run: RunConfig::default(),
            preview: PreviewConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Config {
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        match self.database_path.as_deref() {
            Some(path) => match path.strip_prefix("~/") {
                Some(rest) => dirs::home_dir().map(|h| h.join(rest)),
                None => Some(PathBuf::from(path)),
            },
            None => crate::db::default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_endpoint_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint_url() -> String {
    "http://127.0.0.1:3000/api/categorize".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
    /// A run succeeds while `failed < processed * success_threshold`.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
    /// Records per store read; `0` reads everything at once.
    #[serde(default)]
    pub page_size: usize,
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
    #[serde(default = "default_category_version")]
    pub category_version: String,
}

/// Upper bound on updates in one atomic store commit.
pub const MAX_BATCH_SIZE: usize = 500;

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_rate_limit_delay_ms() -> u64 {
    1500
}

fn default_progress_interval() -> usize {
    10
}

fn default_success_threshold() -> f64 {
    0.10
}

fn default_lock_ttl_secs() -> u64 {
    2 * 60 * 60
}

fn default_category_version() -> String {
    "1.0".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            progress_interval: default_progress_interval(),
            success_threshold: default_success_threshold(),
            page_size: 0,
            lock_ttl_secs: default_lock_ttl_secs(),
            category_version: default_category_version(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_preview_delay_ms")]
    pub delay_ms: u64,
}

fn default_sample_size() -> usize {
    5
}

fn default_preview_delay_ms() -> u64 {
    500
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            delay_ms: default_preview_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_allowed_categories")]
    pub allowed_categories: Vec<String>,
    #[serde(default = "default_fallback_category")]
    pub default_category: String,
}

fn default_allowed_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

fn default_fallback_category() -> String {
    DEFAULT_FALLBACK_CATEGORY.to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_categories: default_allowed_categories(),
            default_category: default_fallback_category(),
        }
    }
}
