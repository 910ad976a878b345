//! Tool catalog
//!
//! A [`ToolSpec`] describes a tool the reasoner may call. The
//! [`ToolCatalog`] trait answers which specs a role set may use.
//! [`RoleCatalog`] is the table-driven implementation: each role is granted
//! capabilities and each tool requires one.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::invocation::{ToolArguments, IDEMPOTENCY_KEY_ARG};
use crate::request::{normalize_role, RoleSet};

/// Description of one callable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object
    pub input_schema: Value,
    /// Whether the call changes remote state
    pub is_write: bool,
    /// Capability a caller must hold to see this tool
    pub required_capability: String,
}

impl ToolSpec {
    /// Read-only tool
    pub fn read(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        required_capability: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            is_write: false,
            required_capability: required_capability.into(),
        }
    }

    /// State-changing tool
    pub fn write(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        required_capability: impl Into<String>,
    ) -> Self {
        Self {
            is_write: true,
            ..Self::read(name, description, input_schema, required_capability)
        }
    }

    /// Whether the schema declares an idempotency key argument
    pub fn accepts_idempotency_key(&self) -> bool {
        self.input_schema
            .get("properties")
            .and_then(|props| props.get(IDEMPOTENCY_KEY_ARG))
            .is_some()
    }
}

/// Source of tool specs for a role set
pub trait ToolCatalog: Send + Sync {
    /// Tools the roles may use, in a stable order
    fn available_tools(&self, roles: &RoleSet) -> Vec<ToolSpec>;
}

/// Arguments that do not satisfy a tool's schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("schema for '{tool}' is invalid: {message}")]
    InvalidSchema { tool: String, message: String },

    #[error("{}", .violations.join("; "))]
    Violations { tool: String, violations: Vec<String> },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("malformed arguments for '{tool}': {message}")]
    Malformed { tool: String, message: String },
}

/// Validate `arguments` against the tool's input schema
pub fn validate_arguments(spec: &ToolSpec, arguments: &ToolArguments) -> Result<(), ArgumentError> {
    let validator =
        jsonschema::Validator::new(&spec.input_schema).map_err(|e| ArgumentError::InvalidSchema {
            tool: spec.name.clone(),
            message: e.to_string(),
        })?;

    let instance = Value::Object(arguments.clone());
    if validator.is_valid(&instance) {
        return Ok(());
    }

    let violations: Vec<String> = validator
        .iter_errors(&instance)
        .map(|e| e.to_string())
        .collect();
    Err(ArgumentError::Violations {
        tool: spec.name.clone(),
        violations,
    })
}

/// Catalog driven by a role-to-capability table
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    tools: Vec<ToolSpec>,
    grants: HashMap<String, BTreeSet<String>>,
}

impl RoleCatalog {
    pub fn new(tools: Vec<ToolSpec>) -> Self {
        Self {
            tools,
            grants: HashMap::new(),
        }
    }

    /// Grant capabilities to a role; the name is normalized like [`RoleSet`]
    pub fn grant<I, S>(mut self, role: &str, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(normalize_role(role))
            .or_default()
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Union of the capabilities granted to any of the roles
    pub fn capabilities_for(&self, roles: &RoleSet) -> BTreeSet<String> {
        roles
            .iter()
            .filter_map(|role| self.grants.get(role))
            .flatten()
            .cloned()
            .collect()
    }
}

impl ToolCatalog for RoleCatalog {
    fn available_tools(&self, roles: &RoleSet) -> Vec<ToolSpec> {
        let capabilities = self.capabilities_for(roles);
        let tools: Vec<ToolSpec> = self
            .tools
            .iter()
            .filter(|tool| capabilities.contains(&tool.required_capability))
            .cloned()
            .collect();
        debug!(
            roles = %roles,
            exposed = tools.len(),
            total = self.tools.len(),
            "Resolved tools for roles"
        );
        tools
    }
}
