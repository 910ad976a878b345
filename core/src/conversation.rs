//! Conversation model
//!
//! A conversation is an append-only list of turns. Every tool-result turn
//! answers an invocation from an earlier assistant turn via `call_id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::invocation::ToolInvocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

/// One entry in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User {
        content: String,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        invocations: Vec<ToolInvocation>,
    },
    ToolResult {
        call_id: String,
        tool: String,
        payload: Value,
        #[serde(default)]
        is_error: bool,
    },
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    pub fn assistant(text: Option<String>, invocations: Vec<ToolInvocation>) -> Self {
        Turn::Assistant { text, invocations }
    }

    pub fn tool_result(invocation: &ToolInvocation, payload: Value) -> Self {
        Turn::ToolResult {
            call_id: invocation.call_id.clone(),
            tool: invocation.name.clone(),
            payload,
            is_error: false,
        }
    }

    /// Error tool-result; the message is wrapped as `{"error": ...}`
    pub fn tool_error(invocation: &ToolInvocation, message: impl Into<String>) -> Self {
        Turn::ToolResult {
            call_id: invocation.call_id.clone(),
            tool: invocation.name.clone(),
            payload: serde_json::json!({ "error": message.into() }),
            is_error: true,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Turn::User { .. } => Role::User,
            Turn::Assistant { .. } => Role::Assistant,
            Turn::ToolResult { .. } => Role::ToolResult,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Turn::ToolResult { is_error: true, .. })
    }
}

/// Ordered transcript of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent non-empty assistant text
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.last_assistant_text_since(0)
    }

    /// Most recent non-empty assistant text among the turns from `start` on
    pub fn last_assistant_text_since(&self, start: usize) -> Option<&str> {
        let start = start.min(self.turns.len());
        self.turns[start..].iter().rev().find_map(|turn| match turn {
            Turn::Assistant { text: Some(text), .. } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &Turn> {
        self.turns
            .iter()
            .filter(|turn| turn.role() == Role::ToolResult)
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

/// Caller-held conversation that a run extends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationHandle {
    pub id: Uuid,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl ConversationHandle {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
        }
    }

    pub fn with_turns(id: Uuid, turns: Vec<Turn>) -> Self {
        Self { id, turns }
    }
}

impl Default for ConversationHandle {
    fn default() -> Self {
        Self::new()
    }
}
