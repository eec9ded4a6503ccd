//! Categorization error types.

use thiserror::Error;

/// Errors returned by a categorization attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategorizeError {
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Server error: {0}")]
    Server(u16),

    #[error("HTTP error: {0}")]
    Http(u16),

    /// Message carried in the `error` field of a non-2xx response body.
    #[error("{0}")]
    Rejected(String),

    #[error("No category returned from API")]
    MissingCategory,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl CategorizeError {
    /// Returns true if this error is worth another attempt.
    ///
    /// Content problems are reported by the endpoint with messages that
    /// mention invalid or missing content; repeating the call cannot fix them.
    pub fn is_retryable(&self) -> bool {
        let message = self.to_string();
        !(message.contains("Invalid")
            || message.contains("No content")
            || message.contains("empty content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        let cases = [
            CategorizeError::RateLimited,
            CategorizeError::Server(503),
            CategorizeError::Http(404),
            CategorizeError::MissingCategory,
            CategorizeError::Request("connection reset".to_string()),
            CategorizeError::Rejected("Upstream model overloaded".to_string()),
        ];
        for err in cases {
            assert!(err.is_retryable(), "{} should be retryable", err);
        }
    }

    #[test]
    fn test_content_errors_are_not_retryable() {
        let cases = [
            "Invalid content provided",
            "No content available for analysis",
            "Request has empty content",
        ];
        for message in cases {
            let err = CategorizeError::Rejected(message.to_string());
            assert!(!err.is_retryable(), "{} should not be retried", message);
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(CategorizeError::Server(502).to_string(), "Server error: 502");
        assert_eq!(CategorizeError::Http(400).to_string(), "HTTP error: 400");
        assert_eq!(
            CategorizeError::MissingCategory.to_string(),
            "No category returned from API"
        );
    }
}
