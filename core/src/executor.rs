//! Remote executor interface
//!
//! A [`RemoteExecutor`] performs named operations against a remote system
//! with credentials bound at construction time. An [`ExecutorFactory`]
//! builds one per request from the caller's credentials.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::invocation::{ToolArguments, ToolOutcome};

#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run one operation; failures are reported in the outcome
    async fn execute(&self, name: &str, arguments: &ToolArguments) -> ToolOutcome;
}

/// Caller credentials for the remote system
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub auth_token: String,
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            refresh_token: None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("executor unavailable: {0}")]
    Unavailable(String),
}

pub trait ExecutorFactory: Send + Sync {
    fn executor_for(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteExecutor>, ExecutionError>;
}
