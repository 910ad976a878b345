//! Sprintwright binary

use clap::Parser;

use sprintwright::cli::{self, bootstrap::load_config, Cli, EXIT_CONFIG_ERROR};
use sprintwright::telemetry::init_telemetry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.command.config_path().map(|p| p.as_path())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let _telemetry = match init_telemetry(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    if let Err(e) = cli::dispatch(cli.command, config).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(cli::exit_code(&e));
    }
}
