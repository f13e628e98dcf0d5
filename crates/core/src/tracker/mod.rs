//! Tracker API abstraction.
//!
//! This module provides a `TrackerApi` trait covering the search and
//! mutation endpoints the execution pipeline needs, plus a Jira REST
//! implementation. Each operation is independently callable and
//! independently fallible.

mod jira;
mod types;

pub use jira::JiraTracker;
pub use types::*;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::issue::ProjectMeta;

/// Remote issue tracker operations consumed by the execution pipeline.
#[async_trait]
pub trait TrackerApi: Send + Sync {
    /// Fetch one page of search results. `None` signals that the tracker
    /// had no result set at all for this query.
    async fn search(&self, request: &SearchRequest) -> Result<Option<SearchPage>, TrackerError>;

    /// Apply a batched field update to one issue.
    async fn edit_issue(
        &self,
        key: &str,
        fields: &BTreeMap<String, Value>,
    ) -> Result<(), TrackerError>;

    /// Apply a named workflow transition to one issue.
    async fn transition_issue(&self, key: &str, transition: &str) -> Result<(), TrackerError>;

    /// Post a comment on one issue.
    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError>;

    /// Fetch project metadata used to enrich fetched issues.
    async fn get_project(&self, key: &str) -> Result<ProjectMeta, TrackerError>;
}
