//! Async Taiga REST client
//!
//! Every request carries the caller's bearer token. GETs are retried once
//! on a server-side failure; POSTs are never retried.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error, warn};

use sprintwright_core::TaigaConfig;

use super::error::TaigaError;
use super::models::{NewTask, NewUserStory, TaigaMilestone, TaigaProject, TaigaTask, TaigaUserStory};

/// A project addressed by numeric id or by slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Id(i64),
    Slug(String),
}

impl ProjectRef {
    /// Digits become an id, anything else a slug
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.parse::<i64>() {
            Ok(id) => ProjectRef::Id(id),
            Err(_) => ProjectRef::Slug(text.to_string()),
        }
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectRef::Id(id) => write!(f, "{}", id),
            ProjectRef::Slug(slug) => f.write_str(slug),
        }
    }
}

impl<'de> Deserialize<'de> for ProjectRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Id(id) => ProjectRef::Id(id),
            Raw::Text(text) => ProjectRef::parse(&text),
        })
    }
}

pub struct TaigaClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl fmt::Debug for TaigaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaigaClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TaigaClient {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TaigaError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TaigaError::Configuration(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
        })
    }

    pub fn from_config(config: &TaigaConfig, auth_token: impl Into<String>) -> Result<Self, TaigaError> {
        Self::new(
            config.base_url.clone(),
            auth_token,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub async fn get_project(&self, project: &ProjectRef) -> Result<TaigaProject, TaigaError> {
        match project {
            ProjectRef::Id(id) => self.get(&format!("/projects/{}", id), &[]).await,
            ProjectRef::Slug(slug) => {
                self.get("/projects/by_slug", &[("slug", slug.clone())])
                    .await
            }
        }
    }

    pub async fn list_milestones(&self, project_id: i64) -> Result<Vec<TaigaMilestone>, TaigaError> {
        self.get("/milestones", &[("project", project_id.to_string())])
            .await
    }

    /// Case-insensitive match on the project's milestone names
    pub async fn find_milestone_by_name(
        &self,
        project_id: i64,
        name: &str,
    ) -> Result<Option<TaigaMilestone>, TaigaError> {
        let wanted = name.trim().to_lowercase();
        let milestones = self.list_milestones(project_id).await?;
        Ok(milestones
            .into_iter()
            .find(|m| m.name.trim().to_lowercase() == wanted))
    }

    pub async fn list_user_stories(
        &self,
        project_id: i64,
        milestone_id: Option<i64>,
    ) -> Result<Vec<TaigaUserStory>, TaigaError> {
        let mut query = vec![("project", project_id.to_string())];
        if let Some(milestone) = milestone_id {
            query.push(("milestone", milestone.to_string()));
        }
        self.get("/userstories", &query).await
    }

    pub async fn create_user_story(&self, story: &NewUserStory) -> Result<TaigaUserStory, TaigaError> {
        self.post("/userstories", story).await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<TaigaTask, TaigaError> {
        self.post("/tasks", task).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, TaigaError> {
        match self.get_once(path, query).await {
            Err(e) if e.is_retryable() => {
                warn!(endpoint = path, error = %e, "Taiga GET failed, retrying once");
                self.get_once(path, query).await
            }
            other => other,
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, TaigaError> {
        debug!(endpoint = path, "Taiga GET");
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.auth_token)
            .query(query)
            .send()
            .await?;
        Self::decode(path, "GET", response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, TaigaError> {
        debug!(endpoint = path, "Taiga POST");
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.auth_token)
            .json(body)
            .send()
            .await?;
        Self::decode(path, "POST", response).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, TaigaError> {
        let status = response.status();
        if !status.is_success() {
            error!(endpoint = path, method, status = status.as_u16(), "Taiga request failed");
            return Err(TaigaError::Http {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
