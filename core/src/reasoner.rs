//! Reasoner interface
//!
//! The reasoner reads the conversation and the tools on offer, then either
//! answers or asks for tool calls.

use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::ToolSpec;
use crate::conversation::Conversation;
use crate::invocation::ToolInvocation;

/// What the reasoner decided for one step
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// The reasoner considers its answer final
    pub is_final: bool,
    pub answer_text: Option<String>,
    pub invocations: Vec<ToolInvocation>,
}

impl Decision {
    pub fn final_answer(text: impl Into<String>) -> Self {
        Self {
            is_final: true,
            answer_text: Some(text.into()),
            invocations: Vec::new(),
        }
    }

    pub fn tool_calls(text: Option<String>, invocations: Vec<ToolInvocation>) -> Self {
        Self {
            is_final: false,
            answer_text: text,
            invocations,
        }
    }

    pub fn requests_tools(&self) -> bool {
        !self.invocations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReasonerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Decide the next step given the transcript so far
    async fn decide(
        &self,
        conversation: &Conversation,
        tools: &[ToolSpec],
    ) -> Result<Decision, ReasonerError>;
}
