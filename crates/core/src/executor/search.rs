//! Paginated search cursor over the tracker.
//!
//! Produces a lazy, finite sequence of issue batches for one query. The
//! cursor is not restartable and must not be reused after exhaustion.

use std::sync::Arc;
use tracing::{debug, error};

use crate::cache::RunCaches;
use crate::issue::{issue_from_raw, project_key_of, Issue, ProjectMeta};
use crate::tracker::{RawIssue, SearchRequest, TrackerApi, TrackerError};

/// Fixed page size for tracker searches.
pub const PAGE_SIZE: u32 = 100;

/// Cursor over the pages of one search query.
pub struct SearchCursor {
    tracker: Arc<dyn TrackerApi>,
    caches: Arc<RunCaches>,
    jql: String,
    start_at: u64,
    done: bool,
}

impl SearchCursor {
    pub fn new(tracker: Arc<dyn TrackerApi>, caches: Arc<RunCaches>, jql: impl Into<String>) -> Self {
        Self {
            tracker,
            caches,
            jql: jql.into(),
            start_at: 0,
            done: false,
        }
    }

    /// Whether the cursor has signaled completion.
    pub fn is_exhausted(&self) -> bool {
        self.done
    }

    /// Fetch the next page. Returns `None` once the sequence is complete.
    ///
    /// A page can legitimately be empty without ending iteration; the end
    /// is signaled by the tracker's reported total, not by emptiness.
    /// Issues that fail deserialization or enrichment are logged and
    /// dropped; a single malformed ticket never aborts the page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Issue>>, TrackerError> {
        if self.done {
            return Ok(None);
        }

        let request = SearchRequest::page(self.jql.clone(), PAGE_SIZE, self.start_at);
        let Some(page) = self.tracker.search(&request).await? else {
            // No result set at all: nothing matches, the sequence is over.
            self.done = true;
            return Ok(None);
        };

        if self.start_at + page.max_results as u64 >= page.total {
            self.done = true;
        }
        self.start_at += PAGE_SIZE as u64;

        let mut issues = Vec::with_capacity(page.issues.len());
        for raw in &page.issues {
            match self.to_domain(raw).await {
                Ok(issue) => issues.push(issue),
                Err(e) => error!(issue = %raw.key, error = %e, "Error mapping bug report"),
            }
        }

        Ok(Some(issues))
    }

    /// Drain the remaining pages into one list.
    pub async fn drain(&mut self) -> Result<Vec<Issue>, TrackerError> {
        let mut issues = Vec::new();
        while let Some(batch) = self.next_page().await? {
            issues.extend(batch);
        }
        Ok(issues)
    }

    /// Deserialize a wire issue and enrich it with project metadata.
    async fn to_domain(&self, raw: &RawIssue) -> Result<Issue, ToDomainError> {
        let project_key = project_key_of(&raw.key)?;
        let project = self.project_meta(project_key).await?;
        Ok(issue_from_raw(raw, project)?)
    }

    async fn project_meta(&self, project_key: &str) -> Result<ProjectMeta, TrackerError> {
        if let Some(meta) = self.caches.projects.get(project_key).await {
            return Ok(meta);
        }

        debug!(project = project_key, "Fetching project metadata");
        let meta = self.tracker.get_project(project_key).await?;
        self.caches.projects.put(meta.clone()).await;
        Ok(meta)
    }
}

/// Per-issue failure while turning a wire issue into a domain snapshot.
#[derive(Debug, thiserror::Error)]
enum ToDomainError {
    #[error(transparent)]
    Issue(#[from] crate::issue::IssueError),
    #[error("project lookup failed: {0}")]
    Project(#[from] TrackerError),
}
