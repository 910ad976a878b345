//! Anthropic Adapter
//!
//! Messages API adapter with native tool use.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument};

use sprintwright_core::{Conversation, Decision, Reasoner, ReasonerError, ToolSpec};

pub use crate::llm::adapters::anthropic_parse::{build_messages, build_tools, parse_messages_response};
use crate::llm::adapters::transport::{HttpTransport, ReqwestTransport, Transport};
use crate::llm::adapters::AdapterError;
use crate::llm::prompts::system_prompt;

/// Anthropic Messages API adapter
#[derive(Debug)]
pub struct AnthropicAdapter {
    /// Base URL (e.g., https://api.anthropic.com)
    base_url: String,
    model: String,
    api_key: String,
    api_version: String,
    max_tokens: u32,
    transport: Transport,
}

impl AnthropicAdapter {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self::with_transport(base_url, model, api_key, Transport::Real(ReqwestTransport::new()))
    }

    /// Create adapter with custom transport (for testing)
    pub fn with_transport(base_url: String, model: String, api_key: String, transport: Transport) -> Self {
        Self {
            base_url,
            model,
            api_key,
            api_version: "2023-06-01".to_string(),
            max_tokens: 4096,
            transport,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Build the Messages API request body
    pub fn build_request(&self, conversation: &Conversation, tools: &[ToolSpec]) -> String {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system_prompt(),
            "messages": build_messages(conversation),
            "tools": build_tools(tools),
        })
        .to_string()
    }

    async fn create_message(&self, conversation: &Conversation, tools: &[ToolSpec]) -> Result<Decision, AdapterError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = self.build_request(conversation, tools);
        let headers = [
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", self.api_version.as_str()),
            ("content-type", "application/json"),
        ];

        let response = self.transport.post_json(&url, &headers, &body).await?;
        let decision = parse_messages_response(&response)?;
        debug!(
            invocations = decision.invocations.len(),
            is_final = decision.is_final,
            "Claude response"
        );
        Ok(decision)
    }
}

#[async_trait]
impl Reasoner for AnthropicAdapter {
    #[instrument(name = "anthropic", skip_all, fields(model = %self.model, turns = conversation.len(), tools = tools.len()))]
    async fn decide(&self, conversation: &Conversation, tools: &[ToolSpec]) -> Result<Decision, ReasonerError> {
        Ok(self.create_message(conversation, tools).await?)
    }
}
