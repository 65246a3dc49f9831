//! Error types for the usage API client.

use smartpower_core::NetworkError;
use thiserror::Error;

/// Result type alias for API client operations.
pub type Result<T> = std::result::Result<T, ApiClientError>;

#[derive(Debug, Error)]
pub enum ApiClientError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the backend
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ApiClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ApiClientError> for NetworkError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::Http(e) if e.is_timeout() => NetworkError::timeout(e.to_string()),
            ApiClientError::Http(e) => NetworkError::transport(e.to_string()),
            ApiClientError::Json(e) => {
                NetworkError::transport(format!("Invalid response body: {}", e))
            }
            ApiClientError::Api { status, message } => NetworkError::status(status, message),
        }
    }
}
