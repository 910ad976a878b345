//! HTTP Transport for LLM Adapters

use async_trait::async_trait;

pub use crate::llm::adapters::transport_fake::{FakeTransport, RecordedRequest};
pub use crate::llm::adapters::transport_reqwest::ReqwestTransport;
pub use crate::llm::adapters::transport_types::{AdapterError, HttpTransport};

/// Concrete transport enum
#[derive(Debug)]
pub enum Transport {
    Real(ReqwestTransport),
    Fake(FakeTransport),
}

#[async_trait]
impl HttpTransport for Transport {
    async fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<String, AdapterError> {
        match self {
            Transport::Real(t) => t.post_json(url, headers, body).await,
            Transport::Fake(t) => t.post_json(url, headers, body).await,
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Transport::Real(ReqwestTransport::new())
    }
}
