//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sprintwright_core::{
    Artifacts, Credentials, Principal, RoleSet, RunOutcome, RunResult, RunUsage, RunWarning, TargetContext,
    ToolSpec,
};
use sprintwright_tools::SprintArtifacts;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserContext {
    pub fn principal(&self) -> Principal {
        let mut principal = Principal::new(self.id, self.username.clone(), RoleSet::from(self.roles.clone()));
        principal.email = self.email.clone();
        principal
    }
}

/// Body of `POST /agent/run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunRequest {
    pub project_id: i64,
    pub milestone_id: i64,
    pub prompt: String,
    pub auth_token: String,
    #[serde(default)]
    pub refresh: Option<String>,
    pub user_context: UserContext,
    #[serde(default)]
    pub user_story_id: Option<i64>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

impl AgentRunRequest {
    pub fn target(&self) -> TargetContext {
        let mut context = TargetContext::new(self.project_id, self.milestone_id);
        context.user_story_id = self.user_story_id;
        context
    }

    pub fn credentials(&self) -> Credentials {
        let mut credentials = Credentials::new(self.auth_token.clone());
        credentials.refresh_token = self.refresh.clone();
        credentials
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunResponse {
    pub run_id: Uuid,
    pub conversation_id: Uuid,
    pub summary: String,
    pub artifacts: Artifacts,
    pub sprint: SprintArtifacts,
    pub warnings: Vec<RunWarning>,
    pub usage: RunUsage,
    pub outcome: RunOutcome,
}

impl AgentRunResponse {
    pub fn new(conversation_id: Uuid, result: RunResult, sprint: SprintArtifacts) -> Self {
        Self {
            run_id: result.run_id,
            conversation_id,
            summary: result.summary,
            artifacts: result.artifacts,
            sprint,
            warnings: result.warnings,
            usage: result.usage,
            outcome: result.outcome,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsQuery {
    #[serde(default)]
    pub roles: String,
}

/// One entry of `GET /agent/tools`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolView {
    pub name: String,
    pub description: String,
    pub is_write: bool,
    pub input_schema: serde_json::Value,
}

impl From<ToolSpec> for ToolView {
    fn from(spec: ToolSpec) -> Self {
        Self {
            name: spec.name,
            description: spec.description,
            is_write: spec.is_write,
            input_schema: spec.input_schema,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub run_id: Uuid,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: AgentRunRequest = serde_json::from_value(json!({
            "project_id": 1,
            "milestone_id": 6,
            "prompt": "Plan",
            "auth_token": "t",
            "user_context": {"id": 3, "username": "lee", "roles": ["Product Owner"]}
        }))
        .unwrap();

        assert!(request.conversation_id.is_none());
        assert!(request.credentials().refresh_token.is_none());
        assert!(request.user_context.principal().roles.contains("product-owner"));
        assert_eq!(request.target().user_story_id, None);
    }
}
