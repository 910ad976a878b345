//! Taiga-backed remote executor

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use sprintwright_core::{
    Credentials, ExecutionError, ExecutorFactory, RemoteExecutor, TaigaConfig, ToolArguments, ToolOutcome,
};

use crate::calls::TaigaCall;
use crate::taiga::{NewTask, NewUserStory, TaigaClient, TaigaError};

/// Executes Taiga tool calls with one caller's token
#[derive(Debug)]
pub struct TaigaExecutor {
    client: TaigaClient,
}

impl TaigaExecutor {
    pub fn new(client: TaigaClient) -> Self {
        Self { client }
    }

    async fn dispatch(&self, call: TaigaCall) -> Result<Value, TaigaError> {
        match call {
            TaigaCall::GetProject(args) => to_payload(self.client.get_project(&args.project_ref).await?),
            TaigaCall::ListMilestones(args) => to_payload(self.client.list_milestones(args.project_id).await?),
            TaigaCall::GetMilestoneByName(args) => {
                match self
                    .client
                    .find_milestone_by_name(args.project_id, &args.sprint_ref)
                    .await?
                {
                    Some(milestone) => to_payload(milestone),
                    None => Err(TaigaError::NotFound(format!("Milestone '{}' not found", args.sprint_ref))),
                }
            }
            TaigaCall::ListUserStories(args) => to_payload(
                self.client
                    .list_user_stories(args.project_id, args.milestone_id)
                    .await?,
            ),
            TaigaCall::CreateUserStory(args) => {
                let story = NewUserStory {
                    project: args.project_id,
                    subject: args.subject,
                    description: args.description,
                    milestone: args.milestone_id,
                    tags: args.tags,
                };
                to_payload(self.client.create_user_story(&story).await?)
            }
            TaigaCall::CreateTask(args) => {
                let task = NewTask {
                    user_story: args.user_story_id,
                    subject: args.subject,
                    description: args.description,
                    project: args.project_id,
                };
                to_payload(self.client.create_task(&task).await?)
            }
        }
    }
}

fn to_payload<T: Serialize>(value: T) -> Result<Value, TaigaError> {
    Ok(serde_json::to_value(value)?)
}

#[async_trait]
impl RemoteExecutor for TaigaExecutor {
    async fn execute(&self, name: &str, arguments: &ToolArguments) -> ToolOutcome {
        let call = match TaigaCall::parse(name, arguments) {
            Ok(call) => call,
            Err(e) => {
                warn!(tool = name, error = %e, "Rejected Taiga call");
                return ToolOutcome::failure(e.to_string());
            }
        };
        debug!(tool = name, write = call.is_write(), "Executing Taiga call");
        match self.dispatch(call).await {
            Ok(payload) => ToolOutcome::success(payload),
            Err(e) => {
                warn!(tool = name, error = %e, "Taiga call failed");
                ToolOutcome::failure(e.to_string())
            }
        }
    }
}

/// Builds a [`TaigaExecutor`] per request
#[derive(Debug, Clone)]
pub struct TaigaExecutorFactory {
    config: TaigaConfig,
}

impl TaigaExecutorFactory {
    pub fn new(config: TaigaConfig) -> Self {
        Self { config }
    }
}

impl ExecutorFactory for TaigaExecutorFactory {
    fn executor_for(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteExecutor>, ExecutionError> {
        if credentials.auth_token.trim().is_empty() {
            return Err(ExecutionError::MissingCredentials);
        }
        let client = TaigaClient::from_config(&self.config, credentials.auth_token.clone())
            .map_err(|e| ExecutionError::Unavailable(e.to_string()))?;
        Ok(Arc::new(TaigaExecutor::new(client)))
    }
}
