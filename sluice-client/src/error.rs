//! Error types for the ingestion client

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the ingestion service
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response (DNS, TLS, connect, timeout)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The configured base URL cannot carry a job path
    #[error("Invalid base URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The certificate bundle could not be loaded
    #[error("Invalid certificate bundle {}: {message}", .path.display())]
    Certificate {
        path: PathBuf,
        message: String,
    },
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the service rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::ApiError { status: 401 | 403, .. })
    }

    /// Check if the client is misconfigured in a way no retry can fix
    pub fn is_invalid_url(&self) -> bool {
        matches!(self, Self::InvalidUrl { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        let not_found = ClientError::api_error(404, "no such job");
        assert!(not_found.is_not_found());
        assert!(!not_found.is_unauthorized());

        let forbidden = ClientError::api_error(403, "bad key");
        assert!(forbidden.is_unauthorized());
        assert!(!forbidden.is_not_found());

        let unavailable = ClientError::api_error(503, "try later");
        assert!(!unavailable.is_not_found());
        assert!(!unavailable.is_unauthorized());

        let bad_url = ClientError::InvalidUrl {
            url: "mailto:ops".to_string(),
            message: "cannot be a base".to_string(),
        };
        assert!(bad_url.is_invalid_url());
        assert!(!ClientError::ParseError("eof".to_string()).is_invalid_url());
    }

    #[test]
    fn test_api_error_display_carries_body() {
        let err = ClientError::api_error(500, "boom");
        assert_eq!(err.to_string(), "API error (status 500): boom");
    }
}
