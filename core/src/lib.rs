//! Sprintwright Core
//!
//! The bounded tool-calling orchestration loop and everything it consults:
//! budget accounting, call deduplication, the conversation model and the
//! narrow traits behind which the external collaborators (tool catalog,
//! remote executor, reasoner) live.
//!
//! A run always terminates with a [`RunResult`]. The only way to get no result
//! is to cancel the run.

pub mod budget;
pub mod catalog;
pub mod config;
pub mod conversation;
pub mod conversation_store;
pub mod dedup;
pub mod error;
pub mod executor;
pub mod fingerprint;
pub mod invocation;
pub mod orchestrator;
pub mod reasoner;
pub mod registry;
pub mod request;
pub mod result;
pub mod testing;

pub use budget::{BudgetCeiling, BudgetSnapshot, BudgetTracker, ChargeKind};
pub use catalog::{validate_arguments, ArgumentError, RoleCatalog, ToolCatalog, ToolSpec};
pub use config::{
    AppConfig, BudgetConfig, ConfigError, ConfigFormat, ConfigManager, ConversationConfig,
    LoggingConfig, ReasonerConfig, ReasonerProvider, ServerConfig, TaigaConfig,
    resolve_env_reference,
};
pub use conversation::{Conversation, ConversationHandle, Role, Turn};
pub use conversation_store::ConversationStore;
pub use dedup::{Admission, CallDeduplicator, RejectReason};
pub use error::{RunCancelled, RunError, RunWarning, WarningKind};
pub use executor::{Credentials, ExecutionError, ExecutorFactory, RemoteExecutor};
pub use fingerprint::{canonical_json, Fingerprint};
pub use invocation::{ToolArguments, ToolInvocation, ToolOutcome, IDEMPOTENCY_KEY_ARG};
pub use orchestrator::Orchestrator;
pub use reasoner::{Decision, Reasoner, ReasonerError};
pub use registry::{RunRegistration, RunRegistry};
pub use request::{Principal, RoleSet, RunRequest, TargetContext};
pub use result::{Artifact, Artifacts, RunOutcome, RunResult, RunUsage};
