//! HTTP client for the remote categorization endpoint.
//!
//! The endpoint takes `{title, description, courseName}` and answers
//! `{category, confidence?}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{CategorizeError, Categorization, CategoryService, UNKNOWN_CONFIDENCE};
use crate::course::ContentPayload;

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpCategoryService {
    client: Client,
    url: String,
}

impl HttpCategoryService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CategorizeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CategorizeError::Request(e.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CategoryService for HttpCategoryService {
    async fn categorize(
        &self,
        payload: &ContentPayload,
    ) -> Result<Categorization, CategorizeError> {
        let resp = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CategorizeError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| CategorizeError::Request(e.to_string()))?;
        debug!(status, bytes = body.len(), "Categorization endpoint responded");
        classify_response(status, &body)
    }
}

/// Maps an endpoint response to a categorization or an error.
pub fn classify_response(status: u16, body: &str) -> Result<Categorization, CategorizeError> {
    if !(200..300).contains(&status) {
        if status == 429 {
            return Err(CategorizeError::RateLimited);
        }
        if status >= 500 {
            return Err(CategorizeError::Server(status));
        }
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty());
        return Err(match message {
            Some(m) => CategorizeError::Rejected(m),
            None => CategorizeError::Http(status),
        });
    }

    let parsed: CategoryResponse =
        serde_json::from_str(body).map_err(|e| CategorizeError::Malformed(e.to_string()))?;
    let category = parsed
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or(CategorizeError::MissingCategory)?;
    let confidence = parsed
        .confidence
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_CONFIDENCE.to_string());

    Ok(Categorization {
        category,
        confidence,
    })
}
