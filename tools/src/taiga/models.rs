//! Taiga domain records
//!
//! Only the fields the tools expose are modelled; unknown fields in API
//! responses are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaigaProject {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaigaMilestone {
    pub id: i64,
    pub name: String,
    pub project: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaigaUserStory {
    pub id: i64,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project: i64,
    #[serde(default)]
    pub milestone: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaigaTask {
    pub id: i64,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    pub user_story: i64,
}

/// Body of `POST /userstories`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUserStory {
    pub project: i64,
    pub subject: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Body of `POST /tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub user_story: i64,
    pub subject: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<i64>,
}

/// Tags arrive either as names or as `[name, color]` pairs
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|tag| match tag {
            Value::String(name) => Some(name),
            Value::Array(parts) => parts.into_iter().next().and_then(|p| p.as_str().map(str::to_string)),
            _ => None,
        })
        .collect())
}
