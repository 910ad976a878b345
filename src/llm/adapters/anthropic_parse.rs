//! Anthropic Messages API encoding and parsing
//!
//! Public functions for building request parts and parsing responses.

use serde_json::{json, Value as JsonValue};

use sprintwright_core::{Conversation, Decision, ToolInvocation, ToolSpec, Turn};

use crate::llm::adapters::AdapterError;

/// Convert a transcript into the `messages` array
///
/// Tool results travel as `tool_result` blocks in user messages. Adjacent
/// turns that map to the same role are merged into one message, so every
/// result of a round lands in the message right after its `tool_use`
/// blocks. Assistant turns with neither text nor calls are dropped.
pub fn build_messages(conversation: &Conversation) -> Vec<JsonValue> {
    let mut messages: Vec<(&'static str, Vec<JsonValue>)> = Vec::new();

    for turn in conversation.turns() {
        let (role, blocks) = match turn {
            Turn::User { content } => ("user", vec![json!({"type": "text", "text": content})]),
            Turn::Assistant { text, invocations } => {
                let mut blocks = Vec::new();
                if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
                    blocks.push(json!({"type": "text", "text": text}));
                }
                blocks.extend(invocations.iter().map(|inv| {
                    json!({
                        "type": "tool_use",
                        "id": inv.call_id,
                        "name": inv.name,
                        "input": inv.arguments_value(),
                    })
                }));
                ("assistant", blocks)
            }
            Turn::ToolResult {
                call_id,
                payload,
                is_error,
                ..
            } => (
                "user",
                vec![json!({
                    "type": "tool_result",
                    "tool_use_id": call_id,
                    "content": payload_text(payload),
                    "is_error": is_error,
                })],
            ),
        };

        if blocks.is_empty() {
            continue;
        }
        match messages.last_mut() {
            Some((last_role, last_blocks)) if *last_role == role => last_blocks.extend(blocks),
            _ => messages.push((role, blocks)),
        }
    }

    messages
        .into_iter()
        .map(|(role, content)| json!({"role": role, "content": content}))
        .collect()
}

/// Convert tool specs into the `tools` array
pub fn build_tools(tools: &[ToolSpec]) -> Vec<JsonValue> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.input_schema,
            })
        })
        .collect()
}

/// Parse a Messages API response into a decision
pub fn parse_messages_response(response: &str) -> Result<Decision, AdapterError> {
    let json: JsonValue = serde_json::from_str(response)?;

    let blocks = json["content"]
        .as_array()
        .ok_or_else(|| AdapterError::InvalidResponse("Missing content array".to_string()))?;

    let mut texts = Vec::new();
    let mut invocations = Vec::new();
    for block in blocks {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(text) = block["text"].as_str() {
                    texts.push(text.to_string());
                }
            }
            Some("tool_use") => {
                let id = block["id"]
                    .as_str()
                    .ok_or_else(|| AdapterError::InvalidResponse("tool_use block without id".to_string()))?;
                let name = block["name"]
                    .as_str()
                    .ok_or_else(|| AdapterError::InvalidResponse("tool_use block without name".to_string()))?;
                invocations.push(ToolInvocation::from_value(id, name, block["input"].clone()));
            }
            _ => {}
        }
    }

    let text = Some(texts.join("\n")).filter(|t| !t.trim().is_empty());
    if invocations.is_empty() {
        Ok(Decision {
            is_final: true,
            answer_text: text,
            invocations,
        })
    } else {
        Ok(Decision::tool_calls(text, invocations))
    }
}

fn payload_text(payload: &JsonValue) -> String {
    match payload {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}
