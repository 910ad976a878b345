//! Transport types
//!
//! Common types shared across transport implementations.

use async_trait::async_trait;

use sprintwright_core::ReasonerError;

/// Adapter errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    /// Network error (connection refused, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP error (non-2xx status)
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited{retry_after}")]
    RateLimited { retry_after: String },

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AdapterError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => AdapterError::Network(err.to_string()),
        }
    }
}

impl From<AdapterError> for ReasonerError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Network(message) => ReasonerError::Transport(message),
            AdapterError::Http { status, message } => ReasonerError::Provider { status, message },
            AdapterError::Authentication(message) => ReasonerError::Provider {
                status: 401,
                message,
            },
            AdapterError::RateLimited { retry_after } => ReasonerError::Provider {
                status: 429,
                message: format!("rate limited{}", retry_after),
            },
            AdapterError::InvalidResponse(message) | AdapterError::Json(message) => {
                ReasonerError::InvalidResponse(message)
            }
            AdapterError::Configuration(message) => ReasonerError::Configuration(message),
        }
    }
}

/// Async HTTP transport
///
/// Abstraction over the HTTP client so adapters can be tested with
/// `FakeTransport`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a JSON body and return the response body
    async fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<String, AdapterError>;
}
