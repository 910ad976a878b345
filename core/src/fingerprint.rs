//! Call fingerprints
//!
//! A fingerprint identifies a tool call by its tool name plus either the
//! caller-supplied idempotency key or the canonical form of its arguments.
//! Object keys are sorted recursively, so argument order never changes the
//! fingerprint.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::invocation::{ToolArguments, ToolInvocation};

/// Hex SHA-256 over the identifying parts of a call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(invocation: &ToolInvocation) -> Self {
        Self::compute(
            &invocation.name,
            &invocation.arguments,
            invocation.idempotency_key.as_deref(),
        )
    }

    pub fn compute(tool: &str, arguments: &ToolArguments, idempotency_key: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"tool=");
        hasher.update(tool.as_bytes());
        hasher.update(b"\n");
        match idempotency_key {
            Some(key) => {
                hasher.update(b"key=");
                hasher.update(key.as_bytes());
            }
            None => {
                hasher.update(b"args=");
                let mut canonical = String::new();
                write_canonical(&mut canonical, &Value::Object(arguments.clone()));
                hasher.update(canonical.as_bytes());
            }
        }
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 16 hex characters, for logs and derived keys
    pub fn short(&self) -> &str {
        self.0.get(..16).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compact JSON with object keys sorted at every depth
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(&mut out, value);
    out
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(out, &map[key]);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
