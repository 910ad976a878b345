//! Run requests and the identity they carry

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::ConversationHandle;

/// Normalized set of role names
///
/// Names are trimmed, lower-cased and inner whitespace becomes `-`, so
/// `"Product Owner"` and `"product-owner"` are the same role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            roles
                .into_iter()
                .map(|role| normalize_role(role.as_ref()))
                .filter(|role| !role.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-separated list such as `"Product Owner, developer"`
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(&normalize_role(role))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Canonical form of a role name
pub fn normalize_role(role: &str) -> String {
    role.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

impl From<Vec<String>> for RoleSet {
    fn from(roles: Vec<String>) -> Self {
        Self::new(roles)
    }
}

impl From<RoleSet> for Vec<String> {
    fn from(roles: RoleSet) -> Self {
        roles.0.into_iter().collect()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(", "))
    }
}

/// The caller a run acts for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: RoleSet,
}

impl Principal {
    pub fn new(user_id: i64, username: impl Into<String>, roles: RoleSet) -> Self {
        Self {
            user_id,
            username: username.into(),
            email: None,
            roles,
        }
    }
}

/// What the run is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetContext {
    pub project_id: i64,
    pub milestone_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_story_id: Option<i64>,
}

impl TargetContext {
    pub fn new(project_id: i64, milestone_id: i64) -> Self {
        Self {
            project_id,
            milestone_id,
            user_story_id: None,
        }
    }

    /// Context lines appended to the opening user turn
    pub fn describe(&self) -> String {
        let mut lines = vec![
            format!("Project ID: {}", self.project_id),
            format!("Milestone ID: {}", self.milestone_id),
        ];
        if let Some(story) = self.user_story_id {
            lines.push(format!("User story ID: {}", story));
        }
        lines.join("\n")
    }
}

/// Input to one orchestration run
///
/// Credentials are not part of the request; they are bound into the remote
/// executor before the run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub run_id: Uuid,
    pub principal: Principal,
    pub context: TargetContext,
    pub instruction: String,
    pub conversation: Option<ConversationHandle>,
}

impl RunRequest {
    pub fn new(principal: Principal, context: TargetContext, instruction: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            principal,
            context,
            instruction: instruction.into(),
            conversation: None,
        }
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn with_conversation(mut self, conversation: ConversationHandle) -> Self {
        self.conversation = Some(conversation);
        self
    }

    /// Text of the user turn that opens this run
    pub fn opening_turn(&self) -> String {
        format!(
            "{}\n\nContext:\n{}",
            self.instruction.trim(),
            self.context.describe()
        )
    }
}
