//! Remote categorization: the service seam, its HTTP client and the retry
//! helper that wraps a single call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::course::ContentPayload;

pub mod error;
pub mod http;
pub mod retry;

pub use error::CategorizeError;
pub use http::HttpCategoryService;
pub use retry::{categorize_once, RetryPolicy};

/// Confidence recorded when the endpoint does not report one.
pub const UNKNOWN_CONFIDENCE: &str = "unknown";

/// A category suggested by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    pub category: String,
    pub confidence: String,
}

/// One remote categorization attempt. Implementations must not retry.
#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn categorize(&self, payload: &ContentPayload)
        -> Result<Categorization, CategorizeError>;
}
