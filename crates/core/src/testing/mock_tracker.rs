//! Mock tracker for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

use crate::issue::ProjectMeta;
use crate::tracker::{RawIssue, SearchPage, SearchRequest, TrackerApi, TrackerError};

/// Mock implementation of the `TrackerApi` trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configured issue list through real pagination
/// - Record every search/edit/transition/comment with its arguments
/// - Inject failures per operation or per issue key
pub struct MockTracker {
    issues: RwLock<Vec<RawIssue>>,
    projects: RwLock<HashMap<String, ProjectMeta>>,
    project_fetches: RwLock<usize>,

    searches: RwLock<Vec<SearchRequest>>,
    edits: RwLock<Vec<(String, BTreeMap<String, Value>)>>,
    transitions: RwLock<Vec<(String, String)>>,
    comments: RwLock<Vec<(String, String)>>,

    next_search_error: RwLock<Option<TrackerError>>,
    return_no_result: RwLock<bool>,
    fail_edits: RwLock<HashSet<String>>,
    fail_transitions: RwLock<HashSet<String>>,
    fail_comments: RwLock<HashSet<String>>,
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTracker {
    pub fn new() -> Self {
        Self {
            issues: RwLock::new(Vec::new()),
            projects: RwLock::new(HashMap::new()),
            project_fetches: RwLock::new(0),
            searches: RwLock::new(Vec::new()),
            edits: RwLock::new(Vec::new()),
            transitions: RwLock::new(Vec::new()),
            comments: RwLock::new(Vec::new()),
            next_search_error: RwLock::new(None),
            return_no_result: RwLock::new(false),
            fail_edits: RwLock::new(HashSet::new()),
            fail_transitions: RwLock::new(HashSet::new()),
            fail_comments: RwLock::new(HashSet::new()),
        }
    }

    /// Set the issues served through pagination, replacing any previous set.
    pub async fn set_search_issues(&self, issues: Vec<RawIssue>) {
        *self.issues.write().await = issues;
    }

    /// Configure a project's metadata.
    pub async fn set_project(&self, meta: ProjectMeta) {
        self.projects.write().await.insert(meta.key.clone(), meta);
    }

    /// Make every search report no result set at all (`None`).
    pub async fn set_return_no_result(&self, value: bool) {
        *self.return_no_result.write().await = value;
    }

    /// Configure the next search to fail with the given error.
    pub async fn fail_next_search(&self, error: TrackerError) {
        *self.next_search_error.write().await = Some(error);
    }

    /// Make every edit for the given issue key fail.
    pub async fn fail_edits_for(&self, key: &str) {
        self.fail_edits.write().await.insert(key.to_string());
    }

    /// Make every transition for the given issue key fail.
    pub async fn fail_transitions_for(&self, key: &str) {
        self.fail_transitions.write().await.insert(key.to_string());
    }

    /// Make every comment post for the given issue key fail.
    pub async fn fail_comments_for(&self, key: &str) {
        self.fail_comments.write().await.insert(key.to_string());
    }

    pub async fn searches(&self) -> Vec<SearchRequest> {
        self.searches.read().await.clone()
    }

    pub async fn edits(&self) -> Vec<(String, BTreeMap<String, Value>)> {
        self.edits.read().await.clone()
    }

    pub async fn transitions(&self) -> Vec<(String, String)> {
        self.transitions.read().await.clone()
    }

    pub async fn comments(&self) -> Vec<(String, String)> {
        self.comments.read().await.clone()
    }

    /// Number of project metadata fetches that reached the tracker.
    pub async fn project_fetches(&self) -> usize {
        *self.project_fetches.read().await
    }

    /// Total number of mutation calls recorded.
    pub async fn mutation_count(&self) -> usize {
        self.edits.read().await.len()
            + self.transitions.read().await.len()
            + self.comments.read().await.len()
    }
}

#[async_trait]
impl TrackerApi for MockTracker {
    async fn search(&self, request: &SearchRequest) -> Result<Option<SearchPage>, TrackerError> {
        if let Some(err) = self.next_search_error.write().await.take() {
            return Err(err);
        }

        self.searches.write().await.push(request.clone());

        if *self.return_no_result.read().await {
            return Ok(None);
        }

        let issues = self.issues.read().await;
        let total = issues.len() as u64;
        let start = (request.start_at as usize).min(issues.len());
        let end = (start + request.max_results as usize).min(issues.len());

        Ok(Some(SearchPage {
            issues: issues[start..end].to_vec(),
            total,
            max_results: request.max_results,
        }))
    }

    async fn edit_issue(
        &self,
        key: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<(), TrackerError> {
        if self.fail_edits.read().await.contains(key) {
            return Err(TrackerError::Api(format!("injected edit failure for {}", key)));
        }
        self.edits
            .write()
            .await
            .push((key.to_string(), fields.clone()));
        Ok(())
    }

    async fn transition_issue(&self, key: &str, transition: &str) -> Result<(), TrackerError> {
        if self.fail_transitions.read().await.contains(key) {
            return Err(TrackerError::Api(format!(
                "injected transition failure for {}",
                key
            )));
        }
        self.transitions
            .write()
            .await
            .push((key.to_string(), transition.to_string()));
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        if self.fail_comments.read().await.contains(key) {
            return Err(TrackerError::Api(format!(
                "injected comment failure for {}",
                key
            )));
        }
        self.comments
            .write()
            .await
            .push((key.to_string(), body.to_string()));
        Ok(())
    }

    async fn get_project(&self, key: &str) -> Result<ProjectMeta, TrackerError> {
        *self.project_fetches.write().await += 1;

        Ok(self
            .projects
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_else(|| ProjectMeta {
                key: key.to_string(),
                name: key.to_string(),
                private: false,
            }))
    }
}
