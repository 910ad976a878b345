//! Subcommand dispatch

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sprintwright_api::{AgentRunRequest, AgentRunResponse, ApiServer, ToolView};
use sprintwright_core::{AppConfig, ConversationStore, ExecutorFactory, RoleSet, RunRequest, ToolCatalog};
use sprintwright_tools::{taiga_catalog, SprintArtifacts, TaigaExecutorFactory};

use crate::cli::bootstrap::{build_orchestrator, build_state};
use crate::cli::{Command, Error, Result, EXIT_CANCELLED, EXIT_CONFIG_ERROR, EXIT_FAILURE};

/// Run a parsed subcommand against a loaded configuration
pub async fn dispatch(command: Command, mut config: AppConfig) -> Result<()> {
    match command {
        Command::Serve { host, port, .. } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Command::Run { request, .. } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });
            let response = run_request_file(&config, &request, cancel).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Tools { roles } => {
            println!("{}", render_tools(&roles)?);
            Ok(())
        }
        Command::CheckConfig { .. } => {
            print!("{}", render_config(&config)?);
            Ok(())
        }
    }
}

/// Map a CLI error to the process exit code
pub fn exit_code(error: &Error) -> i32 {
    match error {
        Error::Config(_) => EXIT_CONFIG_ERROR,
        Error::Cancelled => EXIT_CANCELLED,
        _ => EXIT_FAILURE,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let state = build_state(&config)?;
    let server = ApiServer::new(config.server.clone(), state);
    server
        .start(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        })
        .await?;
    Ok(())
}

/// Read a request file and execute it
pub async fn run_request_file(
    config: &AppConfig,
    path: &Path,
    cancel: CancellationToken,
) -> Result<AgentRunResponse> {
    let content = std::fs::read_to_string(path)?;
    let request: AgentRunRequest = serde_json::from_str(&content)?;
    execute_request(config, request, cancel).await
}

/// Execute one run outside the server
///
/// The conversation is not kept; every invocation starts fresh.
pub async fn execute_request(
    config: &AppConfig,
    body: AgentRunRequest,
    cancel: CancellationToken,
) -> Result<AgentRunResponse> {
    if body.prompt.trim().is_empty() {
        return Err(Error::InvalidRequest("prompt must not be empty".to_string()));
    }
    let orchestrator = build_orchestrator(config)?;
    let executor = TaigaExecutorFactory::new(config.taiga.clone())
        .executor_for(&body.credentials())
        .map_err(|e| Error::InvalidRequest(e.to_string()))?;

    let conversation = ConversationStore::from_config(&config.conversations).open(None);
    let conversation_id = conversation.id;
    let request = RunRequest::new(body.user_context.principal(), body.target(), body.prompt.clone())
        .with_conversation(conversation);
    let result = orchestrator
        .run_cancellable(request, executor.as_ref(), cancel)
        .await
        .map_err(|_| Error::Cancelled)?;

    let sprint = SprintArtifacts::from_artifacts(&result.artifacts, Some(body.milestone_id));
    Ok(AgentRunResponse::new(conversation_id, result, sprint))
}

/// JSON listing of the Taiga tools visible to `roles`
pub fn render_tools(roles: &str) -> Result<String> {
    let tools: Vec<ToolView> = taiga_catalog()
        .available_tools(&RoleSet::parse(roles))
        .into_iter()
        .map(ToolView::from)
        .collect();
    Ok(serde_json::to_string_pretty(&tools)?)
}

/// Effective configuration as TOML, secrets masked
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(&config.redacted()).map_err(|e| Error::Config(e.to_string()))
}
