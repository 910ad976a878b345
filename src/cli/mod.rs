//! Command-line interface
//!
//! `serve`, `run`, `tools` and `check-config` subcommands.

pub mod args;
pub mod bootstrap;
pub mod dispatch;

pub use args::{Cli, Command, ConfigArg};
pub use dispatch::{dispatch, exit_code};

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Server error: {0}")]
    Server(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;
pub const EXIT_CANCELLED: i32 = 130;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;
