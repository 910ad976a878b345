//! Tool invocations and their outcomes

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named arguments for a tool call
pub type ToolArguments = serde_json::Map<String, Value>;

/// Argument name carrying a caller-supplied idempotency key
pub const IDEMPOTENCY_KEY_ARG: &str = "idempotency_key";

/// A single request from the reasoner to call one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Reasoner-assigned id pairing the request with its tool-result turn
    pub call_id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: ToolArguments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl ToolInvocation {
    /// Create an invocation, lifting the idempotency key out of the arguments
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, arguments: ToolArguments) -> Self {
        let idempotency_key = arguments
            .get(IDEMPOTENCY_KEY_ARG)
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .map(str::to_string);
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
            idempotency_key,
        }
    }

    /// Create an invocation from raw reasoner JSON
    ///
    /// `null` becomes empty arguments. Any other non-object value is kept
    /// under a `value` key so schema validation can reject it.
    pub fn from_value(call_id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        let arguments = match input {
            Value::Object(map) => map,
            Value::Null => ToolArguments::new(),
            other => {
                let mut map = ToolArguments::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self::new(call_id, name, arguments)
    }

    /// Attach an idempotency key, mirroring it into the arguments
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.arguments
            .insert(IDEMPOTENCY_KEY_ARG.to_string(), Value::String(key.clone()));
        self.idempotency_key = Some(key);
        self
    }

    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

/// What the remote executor reported for one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn success(payload: Value) -> Self {
        Self {
            success: true,
            payload,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Value::Null,
            error: Some(error.into()),
        }
    }

    /// Error text, or a generic message when the executor gave none
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("tool execution failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_idempotency_key_lifted_from_arguments() {
        let invocation = ToolInvocation::from_value(
            "c1",
            "create_task",
            json!({"subject": "Write docs", "idempotency_key": "abc"}),
        );
        assert_eq!(invocation.idempotency_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_key_ignored() {
        let invocation =
            ToolInvocation::from_value("c1", "create_task", json!({"idempotency_key": ""}));
        assert!(invocation.idempotency_key.is_none());
    }

    #[test]
    fn test_null_input_is_empty_arguments() {
        let invocation = ToolInvocation::from_value("c1", "list_sprint_stories", Value::Null);
        assert!(invocation.arguments.is_empty());
    }

    #[test]
    fn test_scalar_input_wrapped() {
        let invocation = ToolInvocation::from_value("c1", "list_sprint_stories", json!(7));
        assert_eq!(invocation.arguments.get("value"), Some(&json!(7)));
    }

    #[test]
    fn test_with_idempotency_key_mirrors_argument() {
        let invocation = ToolInvocation::new("c1", "create_task", ToolArguments::new())
            .with_idempotency_key("k-1");
        assert_eq!(invocation.arguments[IDEMPOTENCY_KEY_ARG], json!("k-1"));
        assert_eq!(invocation.idempotency_key.as_deref(), Some("k-1"));
    }

    #[test]
    fn test_outcome_error_message() {
        assert_eq!(ToolOutcome::failure("HTTP 500").error_message(), "HTTP 500");
        let mut outcome = ToolOutcome::failure("x");
        outcome.error = None;
        assert_eq!(outcome.error_message(), "tool execution failed");
    }
}
