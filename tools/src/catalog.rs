//! Taiga tool catalog
//!
//! Six tools in a fixed order: four reads, then two writes. Writes require
//! an idempotency key.

use serde_json::{json, Value};

use sprintwright_core::{RoleCatalog, ToolSpec};

use crate::permissions::{self, ROLE_PERMISSIONS};

pub const GET_PROJECT: &str = "taiga_get_project";
pub const LIST_MILESTONES: &str = "taiga_list_milestones";
pub const GET_MILESTONE_BY_NAME: &str = "taiga_get_milestone_by_name";
pub const LIST_USER_STORIES: &str = "taiga_list_user_stories";
pub const CREATE_USER_STORY: &str = "taiga_create_user_story";
pub const CREATE_TASK: &str = "taiga_create_task";

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub fn taiga_tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::read(
            GET_PROJECT,
            "Get project details by slug or ID",
            object(
                json!({
                    "project_ref": {"type": ["string", "integer"], "description": "Project slug or ID"}
                }),
                &["project_ref"],
            ),
            permissions::VIEW_PROJECT,
        ),
        ToolSpec::read(
            LIST_MILESTONES,
            "List all milestones (sprints) for a project",
            object(
                json!({
                    "project_id": {"type": "integer", "description": "Project ID"}
                }),
                &["project_id"],
            ),
            permissions::VIEW_MILESTONES,
        ),
        ToolSpec::read(
            GET_MILESTONE_BY_NAME,
            "Find a milestone by name (e.g., 'Sprint 6')",
            object(
                json!({
                    "project_id": {"type": "integer", "description": "Project ID"},
                    "sprint_ref": {"type": "string", "description": "Sprint name"}
                }),
                &["project_id", "sprint_ref"],
            ),
            permissions::VIEW_MILESTONES,
        ),
        ToolSpec::read(
            LIST_USER_STORIES,
            "List user stories, optionally filtered by milestone",
            object(
                json!({
                    "project_id": {"type": "integer", "description": "Project ID"},
                    "milestone_id": {"type": "integer", "description": "Optional milestone ID filter"}
                }),
                &["project_id"],
            ),
            permissions::VIEW_US,
        ),
        ToolSpec::write(
            CREATE_USER_STORY,
            "Create a new user story",
            object(
                json!({
                    "project_id": {"type": "integer", "description": "Project ID"},
                    "subject": {"type": "string", "minLength": 1, "description": "User story title"},
                    "description": {"type": "string", "description": "User story description"},
                    "milestone_id": {"type": "integer", "description": "Optional milestone ID"},
                    "tags": {"type": "array", "items": {"type": "string"}, "description": "Optional tags"},
                    "idempotency_key": {"type": "string", "description": "Idempotency key"}
                }),
                &["project_id", "subject", "idempotency_key"],
            ),
            permissions::ADD_US,
        ),
        ToolSpec::write(
            CREATE_TASK,
            "Create a new task for a user story",
            object(
                json!({
                    "user_story_id": {"type": "integer", "description": "User story ID"},
                    "subject": {"type": "string", "minLength": 1, "description": "Task title"},
                    "description": {"type": "string", "description": "Task description"},
                    "project_id": {"type": "integer", "description": "Project ID"},
                    "idempotency_key": {"type": "string", "description": "Idempotency key"}
                }),
                &["user_story_id", "subject", "idempotency_key"],
            ),
            permissions::ADD_TASK,
        ),
    ]
}

/// Catalog granting each Taiga role its capabilities
pub fn taiga_catalog() -> RoleCatalog {
    ROLE_PERMISSIONS
        .iter()
        .fold(RoleCatalog::new(taiga_tool_specs()), |catalog, (role, caps)| {
            catalog.grant(role, caps.iter().copied())
        })
}
