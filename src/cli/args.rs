//! CLI argument parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Sprintwright: budgeted LLM agent for Taiga sprint planning
#[derive(Parser, Debug)]
#[command(name = "sprintwright", version, about)]
pub struct Cli {
    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Shared `--config` flag
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigArg {
    /// Config file (TOML or JSON); defaults to the user config directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Start the HTTP API server
    Serve {
        #[command(flatten)]
        config: ConfigArg,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Execute one run from a JSON request file and print the result
    Run {
        #[command(flatten)]
        config: ConfigArg,
        /// Request body in the same shape as `POST /agent/run`
        #[arg(short, long)]
        request: PathBuf,
    },
    /// List the tools visible to a role set
    Tools {
        /// Comma-separated role names
        #[arg(short, long, default_value = "")]
        roles: String,
    },
    /// Load, validate and print the effective configuration
    CheckConfig {
        #[command(flatten)]
        config: ConfigArg,
    },
}

impl Command {
    /// Config path given to this subcommand, if any
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Serve { config, .. } | Command::Run { config, .. } | Command::CheckConfig { config } => {
                config.config.as_ref()
            }
            Command::Tools { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["sprintwright", "serve", "--port", "9000", "--config", "conf.toml"]);
        match cli.command {
            Command::Serve { config, host, port } => {
                assert_eq!(port, Some(9000));
                assert_eq!(host, None);
                assert_eq!(config.config, Some(PathBuf::from("conf.toml")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_requires_request() {
        assert!(Cli::try_parse_from(["sprintwright", "run"]).is_err());
        let cli = Cli::parse_from(["sprintwright", "-v", "run", "--request", "req.json"]);
        assert!(cli.verbose);
        assert_eq!(cli.command.config_path(), None);
    }

    #[test]
    fn test_tools_default_roles() {
        let cli = Cli::parse_from(["sprintwright", "tools"]);
        assert_eq!(cli.command, Command::Tools { roles: String::new() });
    }
}
