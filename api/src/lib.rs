//! Sprintwright API
//!
//! HTTP front door for agent runs: start a run, cancel it, list the tools a
//! role set can use and drop stored conversations.

pub mod error;
pub mod handlers;
pub mod models;
pub mod server;

pub use error::ApiError;
pub use handlers::ApiState;
pub use models::{AgentRunRequest, AgentRunResponse, CancelResponse, ToolView, UserContext};
pub use server::{router, sweep_conversations, ApiServer};
