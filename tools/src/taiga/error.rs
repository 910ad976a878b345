//! Taiga client errors

#[derive(Debug, thiserror::Error)]
pub enum TaigaError {
    /// Connection refused, timeout, TLS failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx status
    #[error("Taiga API error: {status} on {endpoint}")]
    Http { status: u16, endpoint: String },

    /// Body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Lookup matched nothing
    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl TaigaError {
    /// Server-side failures worth one more attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaigaError::Http { status, .. } if *status >= 500 || *status == 429)
    }
}

impl From<reqwest::Error> for TaigaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TaigaError::InvalidResponse(err.to_string())
        } else {
            TaigaError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TaigaError {
    fn from(err: serde_json::Error) -> Self {
        TaigaError::Json(err.to_string())
    }
}
