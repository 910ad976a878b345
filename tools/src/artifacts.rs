//! Sprint view of a run's created artifacts
//!
//! Groups created tasks under their user stories. Tasks that landed on a
//! story the run did not create still get a story entry; its subject is
//! taken from any story listing the run observed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sprintwright_core::Artifacts;

use crate::catalog::{CREATE_TASK, CREATE_USER_STORY, LIST_USER_STORIES};
use crate::taiga::{TaigaTask, TaigaUserStory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintTask {
    pub id: i64,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintStory {
    pub id: i64,
    pub subject: Option<String>,
    pub tasks: Vec<SprintTask>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintArtifacts {
    pub milestone_id: Option<i64>,
    pub user_stories: Vec<SprintStory>,
}

impl SprintArtifacts {
    pub fn from_artifacts(artifacts: &Artifacts, milestone_id: Option<i64>) -> Self {
        let mut sprint = SprintArtifacts {
            milestone_id,
            user_stories: Vec::new(),
        };

        for story in artifacts
            .created_by(CREATE_USER_STORY)
            .filter_map(|a| decode::<TaigaUserStory>(&a.payload))
        {
            if sprint.milestone_id.is_none() {
                sprint.milestone_id = story.milestone;
            }
            sprint.user_stories.push(SprintStory {
                id: story.id,
                subject: Some(story.subject),
                tasks: Vec::new(),
            });
        }

        let observed: Vec<TaigaUserStory> = artifacts
            .observed
            .iter()
            .filter(|a| a.operation == LIST_USER_STORIES)
            .filter_map(|a| decode::<Vec<TaigaUserStory>>(&a.payload))
            .flatten()
            .collect();

        for task in artifacts
            .created_by(CREATE_TASK)
            .filter_map(|a| decode::<TaigaTask>(&a.payload))
        {
            let entry = sprint.story_mut(task.user_story, &observed);
            entry.tasks.push(SprintTask {
                id: task.id,
                subject: task.subject,
            });
        }

        sprint
    }

    pub fn task_count(&self) -> usize {
        self.user_stories.iter().map(|s| s.tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.user_stories.is_empty()
    }

    fn story_mut(&mut self, id: i64, observed: &[TaigaUserStory]) -> &mut SprintStory {
        let index = match self.user_stories.iter().position(|s| s.id == id) {
            Some(index) => index,
            None => {
                let subject = observed
                    .iter()
                    .find(|s| s.id == id)
                    .map(|s| s.subject.clone());
                self.user_stories.push(SprintStory {
                    id,
                    subject,
                    tasks: Vec::new(),
                });
                self.user_stories.len() - 1
            }
        };
        &mut self.user_stories[index]
    }
}

fn decode<T: serde::de::DeserializeOwned>(payload: &Value) -> Option<T> {
    serde_json::from_value(payload.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sprintwright_core::{Artifact, Fingerprint, ToolArguments};

    fn artifact(operation: &str, payload: Value) -> Artifact {
        let mut args = ToolArguments::new();
        args.insert("payload".into(), payload.clone());
        Artifact {
            operation: operation.to_string(),
            fingerprint: Fingerprint::compute(operation, &args, None),
            payload,
        }
    }

    #[test]
    fn test_tasks_grouped_under_created_story() {
        let mut artifacts = Artifacts::default();
        artifacts.record(
            true,
            artifact(
                CREATE_USER_STORY,
                json!({"id": 10, "subject": "Checkout", "project": 1, "milestone": 4}),
            ),
        );
        artifacts.record(
            true,
            artifact(CREATE_TASK, json!({"id": 100, "subject": "API", "user_story": 10})),
        );
        artifacts.record(
            true,
            artifact(CREATE_TASK, json!({"id": 101, "subject": "UI", "user_story": 10})),
        );

        let sprint = SprintArtifacts::from_artifacts(&artifacts, None);
        assert_eq!(sprint.milestone_id, Some(4));
        assert_eq!(sprint.user_stories.len(), 1);
        assert_eq!(sprint.user_stories[0].subject.as_deref(), Some("Checkout"));
        assert_eq!(sprint.task_count(), 2);
    }

    #[test]
    fn test_task_on_existing_story_uses_observed_subject() {
        let mut artifacts = Artifacts::default();
        artifacts.record(
            false,
            artifact(
                LIST_USER_STORIES,
                json!([{"id": 7, "subject": "Search", "project": 1, "milestone": 2}]),
            ),
        );
        artifacts.record(
            true,
            artifact(CREATE_TASK, json!({"id": 70, "subject": "Index", "user_story": 7})),
        );
        artifacts.record(
            true,
            artifact(CREATE_TASK, json!({"id": 80, "subject": "Orphan", "user_story": 8})),
        );

        let sprint = SprintArtifacts::from_artifacts(&artifacts, Some(2));
        assert_eq!(sprint.milestone_id, Some(2));
        assert_eq!(sprint.user_stories[0].subject.as_deref(), Some("Search"));
        assert_eq!(sprint.user_stories[1].subject, None);
        assert_eq!(sprint.user_stories[1].tasks[0].id, 80);
    }

    #[test]
    fn test_empty_run_has_no_stories() {
        let sprint = SprintArtifacts::from_artifacts(&Artifacts::default(), None);
        assert!(sprint.is_empty());
        assert_eq!(sprint.task_count(), 0);
    }
}
