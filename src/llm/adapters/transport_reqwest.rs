//! Real HTTP transport using reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::llm::adapters::transport_types::{AdapterError, HttpTransport};

/// Real HTTP transport using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create new transport with default timeout (60s)
    pub fn new() -> Self {
        Self::with_timeout(60)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<String, AdapterError> {
        debug!(url, body_len = body.len(), "LLM POST");
        let mut request = self.client.post(url).body(body.to_string());
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.text().await?);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|v| format!(" (retry after {}s)", v))
            .unwrap_or_default();
        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Err(match status {
            StatusCode::UNAUTHORIZED => AdapterError::Authentication(message),
            StatusCode::TOO_MANY_REQUESTS => AdapterError::RateLimited { retry_after },
            _ => AdapterError::Http {
                status: status.as_u16(),
                message,
            },
        })
    }
}

/// `error.message` of a provider error body
fn error_message(body: &str) -> Option<String> {
    let json: JsonValue = serde_json::from_str(body).ok()?;
    json["error"]["message"].as_str().map(str::to_string)
}
