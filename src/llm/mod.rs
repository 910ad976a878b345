//! LLM integration
//!
//! Reasoner implementations for the orchestration loop: an Anthropic
//! Messages API adapter over a swappable HTTP transport, and an offline
//! stub.

pub mod adapters;
pub mod prompts;

pub use adapters::{create_reasoner, transport::AdapterError, Adapter};
pub use prompts::system_prompt;
