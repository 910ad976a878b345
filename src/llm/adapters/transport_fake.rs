//! Fake transport for testing
//!
//! Replays fixture strings instead of making HTTP calls, and records what
//! it was sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::adapters::transport_types::{AdapterError, HttpTransport};

/// One request seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Fake transport for testing (uses fixture strings)
#[derive(Debug, Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<String, AdapterError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    /// Create fake transport with given response
    pub fn new(response: &str) -> Self {
        Self::with_responses(vec![Ok(response.to_string())])
    }

    /// Responses are handed out in order; the last one repeats
    pub fn with_responses(responses: Vec<Result<String, AdapterError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create fake transport that returns a network error
    pub fn with_error(msg: &str) -> Self {
        Self::with_responses(vec![Err(AdapterError::Network(msg.to_string()))])
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<String, AdapterError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.to_string(),
            });

        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if responses.len() > 1 {
            responses
                .pop_front()
                .unwrap_or_else(|| Err(AdapterError::InvalidResponse("no fixture".to_string())))
        } else {
            responses
                .front()
                .cloned()
                .unwrap_or_else(|| Err(AdapterError::InvalidResponse("no fixture".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_transport_basic() {
        let transport = FakeTransport::new("test response");
        let result = transport.post_json("http://test", &[], "{}").await;
        assert_eq!(result.unwrap(), "test response");
        assert_eq!(transport.requests()[0].url, "http://test");
    }

    #[tokio::test]
    async fn test_fake_transport_with_error() {
        let transport = FakeTransport::with_error("test error");
        let result = transport.post_json("http://test", &[], "{}").await;
        assert_eq!(result, Err(AdapterError::Network("test error".to_string())));
    }

    #[tokio::test]
    async fn test_fake_transport_sequence_repeats_last() {
        let transport = FakeTransport::with_responses(vec![Ok("one".into()), Ok("two".into())]);
        assert_eq!(transport.post_json("u", &[], "").await.unwrap(), "one");
        assert_eq!(transport.post_json("u", &[], "").await.unwrap(), "two");
        assert_eq!(transport.post_json("u", &[], "").await.unwrap(), "two");
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn test_adapter_error_display() {
        let err = AdapterError::Http {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(format!("{}", err), "HTTP error 404: not found");

        let err = AdapterError::RateLimited {
            retry_after: " (retry after 60s)".to_string(),
        };
        assert!(format!("{}", err).contains("60s"));
    }
}
