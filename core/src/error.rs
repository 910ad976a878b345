//! Run error taxonomy
//!
//! Every degradation a run can experience maps onto a [`RunError`]. The
//! orchestrator never hands these to the caller directly: each one is
//! folded into the result as a [`RunWarning`]. Cancellation is the single
//! exception and is reported as [`RunCancelled`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::budget::BudgetCeiling;

/// Warning category attached to a run result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// No tools available for the caller's role set
    Configuration,
    /// Reasoner transport or provider failure
    ReasonerUnavailable,
    /// Remote executor reported a failure
    ToolExecutionFailure,
    /// A budget ceiling was breached
    BudgetExceeded,
    /// Repetition ceiling reached for one fingerprint
    DuplicateRejected,
    /// Arguments failed schema validation
    InvalidArguments,
    /// Invocation named a tool outside the caller's catalog
    UnknownTool,
}

impl WarningKind {
    /// Whether this kind ends the run
    pub fn is_run_terminating(&self) -> bool {
        matches!(
            self,
            WarningKind::Configuration
                | WarningKind::ReasonerUnavailable
                | WarningKind::BudgetExceeded
        )
    }
}

/// One entry of the ordered warnings list in a [`crate::RunResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl RunWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Typed run errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    #[error("User has no permissions for roles [{roles}]")]
    Configuration { roles: String },

    #[error("LLM error: {0}")]
    ReasonerUnavailable(String),

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecutionFailure { tool: String, message: String },

    #[error("{0}")]
    BudgetExceeded(BudgetCeiling),

    #[error("Loop detected: '{tool}' requested {attempts} times (limit {limit})")]
    DuplicateRejected {
        tool: String,
        attempts: usize,
        limit: usize,
    },

    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool '{0}' is not available for this caller")]
    UnknownTool(String),
}

impl RunError {
    /// Warning category for this error
    pub fn kind(&self) -> WarningKind {
        match self {
            RunError::Configuration { .. } => WarningKind::Configuration,
            RunError::ReasonerUnavailable(_) => WarningKind::ReasonerUnavailable,
            RunError::ToolExecutionFailure { .. } => WarningKind::ToolExecutionFailure,
            RunError::BudgetExceeded(_) => WarningKind::BudgetExceeded,
            RunError::DuplicateRejected { .. } => WarningKind::DuplicateRejected,
            RunError::InvalidArguments { .. } => WarningKind::InvalidArguments,
            RunError::UnknownTool(_) => WarningKind::UnknownTool,
        }
    }

    /// Convert into the warning surfaced in the run result
    pub fn to_warning(&self) -> RunWarning {
        RunWarning::new(self.kind(), self.to_string())
    }
}

/// The caller aborted the run before it reached a reportable terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("run {run_id} was cancelled")]
pub struct RunCancelled {
    pub run_id: Uuid,
}
