//! Sprintwright
//!
//! Process wiring for the budgeted Taiga agent: the command-line interface,
//! logging bootstrap and the LLM reasoner adapters. The orchestration loop
//! lives in `sprintwright-core`, the Taiga collaborator in
//! `sprintwright-tools` and the HTTP front door in `sprintwright-api`.

pub mod cli;
pub mod llm;
pub mod telemetry;

pub use cli::{Cli, Command};
pub use llm::{create_reasoner, Adapter, AdapterError};
