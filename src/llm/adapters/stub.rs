//! Stub Adapter
//!
//! Reasoner that answers immediately without network calls. Used for smoke
//! tests and when no provider is configured.

use async_trait::async_trait;

use sprintwright_core::{Conversation, Decision, Reasoner, ReasonerError, ToolSpec};

/// Stub reasoner (final answer on the first step)
#[derive(Debug)]
pub struct StubAdapter {
    response: String,
}

impl StubAdapter {
    pub fn new() -> Self {
        Self {
            response: "Stub reasoner: no model configured, nothing was changed".to_string(),
        }
    }

    /// Create stub adapter with custom response
    pub fn with_response(response: String) -> Self {
        Self { response }
    }
}

impl Default for StubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reasoner for StubAdapter {
    async fn decide(&self, _conversation: &Conversation, _tools: &[ToolSpec]) -> Result<Decision, ReasonerError> {
        Ok(Decision::final_answer(self.response.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_answers_immediately() {
        let decision = StubAdapter::with_response("fine".into())
            .decide(&Conversation::new(), &[])
            .await
            .unwrap();
        assert!(decision.is_final);
        assert_eq!(decision.answer_text.as_deref(), Some("fine"));
    }
}
