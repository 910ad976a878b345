//! Sprintwright Tools
//!
//! The Taiga side of the orchestrator: a REST client, the role permission
//! table, the tool catalog built on it, typed per-tool arguments, the
//! remote executor that dispatches them, and the sprint view of a run's
//! created artifacts.

pub mod artifacts;
pub mod calls;
pub mod catalog;
pub mod executor;
pub mod permissions;
pub mod taiga;

pub use artifacts::{SprintArtifacts, SprintStory, SprintTask};
pub use calls::TaigaCall;
pub use catalog::{taiga_catalog, taiga_tool_specs};
pub use executor::{TaigaExecutor, TaigaExecutorFactory};
pub use taiga::{ProjectRef, TaigaClient, TaigaError};
