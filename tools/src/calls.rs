//! Typed Taiga tool arguments
//!
//! Each tool's argument object is parsed into its own record before any
//! request is made.

use serde::Deserialize;
use serde_json::{json, Value};

use sprintwright_core::{ArgumentError, ToolArguments};

use crate::catalog;
use crate::taiga::ProjectRef;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetProjectArgs {
    pub project_ref: ProjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListMilestonesArgs {
    pub project_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MilestoneByNameArgs {
    pub project_id: i64,
    pub sprint_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListUserStoriesArgs {
    pub project_id: i64,
    #[serde(default)]
    pub milestone_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserStoryArgs {
    pub project_id: i64,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub milestone_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTaskArgs {
    pub user_story_id: i64,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    pub idempotency_key: String,
}

/// One parsed Taiga tool call
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "tool", content = "arguments")]
pub enum TaigaCall {
    #[serde(rename = "taiga_get_project")]
    GetProject(GetProjectArgs),
    #[serde(rename = "taiga_list_milestones")]
    ListMilestones(ListMilestonesArgs),
    #[serde(rename = "taiga_get_milestone_by_name")]
    GetMilestoneByName(MilestoneByNameArgs),
    #[serde(rename = "taiga_list_user_stories")]
    ListUserStories(ListUserStoriesArgs),
    #[serde(rename = "taiga_create_user_story")]
    CreateUserStory(CreateUserStoryArgs),
    #[serde(rename = "taiga_create_task")]
    CreateTask(CreateTaskArgs),
}

const KNOWN_TOOLS: &[&str] = &[
    catalog::GET_PROJECT,
    catalog::LIST_MILESTONES,
    catalog::GET_MILESTONE_BY_NAME,
    catalog::LIST_USER_STORIES,
    catalog::CREATE_USER_STORY,
    catalog::CREATE_TASK,
];

impl TaigaCall {
    pub fn parse(name: &str, arguments: &ToolArguments) -> Result<Self, ArgumentError> {
        if !KNOWN_TOOLS.contains(&name) {
            return Err(ArgumentError::UnknownTool(name.to_string()));
        }
        let tagged: Value = json!({ "tool": name, "arguments": arguments });
        serde_json::from_value(tagged).map_err(|e| ArgumentError::Malformed {
            tool: name.to_string(),
            message: e.to_string(),
        })
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            TaigaCall::GetProject(_) => catalog::GET_PROJECT,
            TaigaCall::ListMilestones(_) => catalog::LIST_MILESTONES,
            TaigaCall::GetMilestoneByName(_) => catalog::GET_MILESTONE_BY_NAME,
            TaigaCall::ListUserStories(_) => catalog::LIST_USER_STORIES,
            TaigaCall::CreateUserStory(_) => catalog::CREATE_USER_STORY,
            TaigaCall::CreateTask(_) => catalog::CREATE_TASK,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, TaigaCall::CreateUserStory(_) | TaigaCall::CreateTask(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_create_task() {
        let call = TaigaCall::parse(
            "taiga_create_task",
            &args(json!({"user_story_id": 8, "subject": "Add index", "idempotency_key": "k"})),
        )
        .unwrap();
        match &call {
            TaigaCall::CreateTask(task) => {
                assert_eq!(task.user_story_id, 8);
                assert_eq!(task.description, "");
                assert_eq!(task.project_id, None);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(call.is_write());
        assert_eq!(call.tool_name(), "taiga_create_task");
    }

    #[test]
    fn test_parse_project_by_slug() {
        let call = TaigaCall::parse("taiga_get_project", &args(json!({"project_ref": "alpha"}))).unwrap();
        assert_eq!(
            call,
            TaigaCall::GetProject(GetProjectArgs {
                project_ref: ProjectRef::Slug("alpha".into())
            })
        );
        assert!(!call.is_write());
    }

    #[test]
    fn test_unknown_tool() {
        assert_eq!(
            TaigaCall::parse("taiga_delete_everything", &ToolArguments::new()),
            Err(ArgumentError::UnknownTool("taiga_delete_everything".into()))
        );
    }

    #[test]
    fn test_malformed_arguments() {
        let err = TaigaCall::parse("taiga_list_milestones", &args(json!({"project_id": "x"}))).unwrap_err();
        assert!(matches!(err, ArgumentError::Malformed { .. }));
    }
}
