//! Jira REST implementation of the tracker API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::issue::ProjectMeta;

use super::{SearchPage, SearchRequest, TrackerError};

/// Jira REST tracker client.
pub struct JiraTracker {
    client: Client,
    config: TrackerConfig,
}

impl JiraTracker {
    /// Create a new JiraTracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| TrackerError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Build an API URL under the instance base.
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/rest/api/2/{}",
            self.config.url.trim_end_matches('/'),
            path
        )
    }

    fn issue_url(&self, key: &str, suffix: &str) -> String {
        self.api_url(&format!("issue/{}{}", urlencoding::encode(key), suffix))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.config.email, Some(&self.config.api_token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, TrackerError> {
        let response = self.authed(builder).send().await.map_err(|e| {
            if e.is_timeout() {
                TrackerError::Timeout
            } else if e.is_connect() {
                TrackerError::ConnectionFailed(e.to_string())
            } else {
                TrackerError::Api(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TrackerError::Auth(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Api(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response)
    }

    /// Resolve a transition name to the id Jira expects.
    async fn resolve_transition_id(
        &self,
        key: &str,
        transition: &str,
    ) -> Result<String, TrackerError> {
        let url = self.issue_url(key, "/transitions");
        let response = self.send(self.client.get(&url)).await?;

        let transitions: TransitionsResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::Decode(e.to_string()))?;

        transitions
            .transitions
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(transition))
            .map(|t| t.id)
            .ok_or_else(|| {
                TrackerError::Api(format!(
                    "transition `{}` not available on issue {}",
                    transition, key
                ))
            })
    }
}

#[async_trait]
impl super::TrackerApi for JiraTracker {
    async fn search(&self, request: &SearchRequest) -> Result<Option<SearchPage>, TrackerError> {
        let url = self.api_url("search");
        debug!(jql = %request.jql, start_at = request.start_at, "Searching tracker");

        let body = json!({
            "jql": request.jql,
            "fields": request.fields,
            "expand": request.expand,
            "maxResults": request.max_results,
            "startAt": request.start_at,
        });

        let response = match self.send(self.client.post(&url).json(&body)).await {
            Ok(response) => response,
            // A vanished filter or board yields 404; treat it as "no matches".
            Err(TrackerError::Api(msg)) if msg.starts_with("HTTP 404") => return Ok(None),
            Err(e) => return Err(e),
        };

        let page: SearchPage = response
            .json()
            .await
            .map_err(|e| TrackerError::Decode(e.to_string()))?;

        debug!(
            returned = page.issues.len(),
            total = page.total,
            "Search page fetched"
        );

        Ok(Some(page))
    }

    async fn edit_issue(
        &self,
        key: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<(), TrackerError> {
        let url = self.issue_url(key, "");
        debug!(issue = key, fields = fields.len(), "Editing issue");

        self.send(self.client.put(&url).json(&json!({ "fields": fields })))
            .await?;
        Ok(())
    }

    async fn transition_issue(&self, key: &str, transition: &str) -> Result<(), TrackerError> {
        let id = self.resolve_transition_id(key, transition).await?;
        let url = self.issue_url(key, "/transitions");
        debug!(issue = key, transition = transition, "Transitioning issue");

        self.send(
            self.client
                .post(&url)
                .json(&json!({ "transition": { "id": id } })),
        )
        .await?;
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        let url = self.issue_url(key, "/comment");
        debug!(issue = key, "Posting comment");

        self.send(self.client.post(&url).json(&json!({ "body": body })))
            .await?;
        Ok(())
    }

    async fn get_project(&self, key: &str) -> Result<ProjectMeta, TrackerError> {
        let url = self.api_url(&format!("project/{}", urlencoding::encode(key)));

        let response = self.send(self.client.get(&url)).await?;
        let project: ProjectResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::Decode(e.to_string()))?;

        Ok(ProjectMeta {
            key: project.key,
            name: project.name,
            private: project.is_private.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<TransitionEntry>,
}

#[derive(Debug, Deserialize)]
struct TransitionEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    key: String,
    name: String,
    #[serde(rename = "isPrivate")]
    is_private: Option<bool>,
}
