//! LLM Adapters
//!
//! Reasoner implementations behind the core `Reasoner` trait.

pub mod anthropic;
pub mod anthropic_parse;
pub mod factory;
pub mod stub;
pub mod transport;
pub mod transport_fake;
pub mod transport_reqwest;
pub mod transport_types;

use async_trait::async_trait;

use sprintwright_core::{Conversation, Decision, Reasoner, ReasonerError, ToolSpec};

pub use factory::create_reasoner;
pub use transport::{AdapterError, HttpTransport};

/// Concrete reasoner type for every supported provider
#[derive(Debug)]
pub enum Adapter {
    Anthropic(anthropic::AnthropicAdapter),
    Stub(stub::StubAdapter),
}

impl Adapter {
    /// Provider name for logging
    pub fn provider_name(&self) -> &str {
        match self {
            Adapter::Anthropic(_) => "anthropic",
            Adapter::Stub(_) => "stub",
        }
    }
}

#[async_trait]
impl Reasoner for Adapter {
    async fn decide(&self, conversation: &Conversation, tools: &[ToolSpec]) -> Result<Decision, ReasonerError> {
        match self {
            Adapter::Anthropic(a) => a.decide(conversation, tools).await,
            Adapter::Stub(a) => a.decide(conversation, tools).await,
        }
    }
}
