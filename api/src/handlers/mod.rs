//! API Handlers Module
//!
//! Request handlers for the agent endpoints.

use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use sprintwright_core::{
    ConversationHandle, ConversationStore, ExecutorFactory, Orchestrator, RoleSet, RunRegistry, RunRequest,
};
use sprintwright_tools::SprintArtifacts;

use crate::error::ApiError;
use crate::models::{AgentRunRequest, AgentRunResponse, CancelResponse, ToolView, ToolsQuery};

/// Shared state of the API server
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub executors: Arc<dyn ExecutorFactory>,
    pub conversations: Arc<ConversationStore>,
    pub runs: RunRegistry,
}

impl ApiState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        executors: Arc<dyn ExecutorFactory>,
        conversations: Arc<ConversationStore>,
    ) -> Self {
        Self {
            orchestrator,
            executors,
            conversations,
            runs: RunRegistry::new(),
        }
    }
}

/// Health check endpoint
#[debug_handler]
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Execute one agent run
///
/// The run is cancelled when the registry is told to, or when the client
/// goes away and this future is dropped.
#[debug_handler]
pub async fn run_agent(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<AgentRunRequest>,
) -> Result<Json<AgentRunResponse>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }
    info!(
        project_id = body.project_id,
        milestone_id = body.milestone_id,
        user_id = body.user_context.id,
        "Agent run request"
    );

    let executor = state.executors.executor_for(&body.credentials())?;
    let conversation = state.conversations.open(body.conversation_id);
    let conversation_id = conversation.id;

    let request = RunRequest::new(body.user_context.principal(), body.target(), body.prompt.clone())
        .with_conversation(conversation);
    let registration = state.runs.register(request.run_id);
    let _cancel_on_drop = registration.token().drop_guard();

    let result = state
        .orchestrator
        .run_cancellable(request, executor.as_ref(), registration.token())
        .await?;

    state.conversations.save(ConversationHandle::with_turns(
        conversation_id,
        result.transcript.clone().into_turns(),
    ));
    let sprint = SprintArtifacts::from_artifacts(&result.artifacts, Some(body.milestone_id));
    Ok(Json(AgentRunResponse::new(conversation_id, result, sprint)))
}

/// Signal a live run to stop
#[debug_handler]
pub async fn cancel_run(
    State(state): State<Arc<ApiState>>,
    Path(run_id): Path<Uuid>,
) -> Result<(StatusCode, Json<CancelResponse>), ApiError> {
    if state.runs.cancel(&run_id) {
        Ok((
            StatusCode::ACCEPTED,
            Json(CancelResponse {
                run_id,
                cancelled: true,
            }),
        ))
    } else {
        Err(ApiError::NotFound(format!("run {} is not running", run_id)))
    }
}

/// Tools visible to a comma-separated role list
#[debug_handler]
pub async fn list_tools(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ToolsQuery>,
) -> Json<Vec<ToolView>> {
    let roles = RoleSet::parse(&query.roles);
    let tools = state
        .orchestrator
        .catalog()
        .available_tools(&roles)
        .into_iter()
        .map(ToolView::from)
        .collect();
    Json(tools)
}

#[debug_handler]
pub async fn delete_conversation(
    State(state): State<Arc<ApiState>>,
    Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.conversations.remove(&conversation_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "conversation {} not found",
            conversation_id
        )))
    }
}
