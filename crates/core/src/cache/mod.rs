//! Process-lifetime caches shared across a run.
//!
//! Both caches are unbounded and use a full-clear-on-flush policy: the
//! coordinator flushes them exactly once at the end of every run,
//! including the abort path, to bound staleness. They are injected into
//! whatever needs them rather than accessed as globals.

use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::issue::ProjectMeta;

/// Caches created at process start and flushed after every run.
#[derive(Debug, Default)]
pub struct RunCaches {
    pub projects: ProjectCache,
    pub comments: CommentCache,
}

impl RunCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear both caches. Called once per run regardless of outcome.
    pub async fn flush_all(&self) {
        self.projects.flush().await;
        self.comments.flush().await;
    }
}

/// Memoizes project metadata lookups during issue enrichment.
#[derive(Debug, Default)]
pub struct ProjectCache {
    inner: RwLock<HashMap<String, ProjectMeta>>,
}

impl ProjectCache {
    pub async fn get(&self, project_key: &str) -> Option<ProjectMeta> {
        self.inner.read().await.get(project_key).cloned()
    }

    pub async fn put(&self, meta: ProjectMeta) {
        self.inner.write().await.insert(meta.key.clone(), meta);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn flush(&self) {
        self.inner.write().await.clear();
    }
}

/// Tracks which canned comments have already been staged this run so a
/// module never posts the same comment on the same issue twice.
#[derive(Debug, Default)]
pub struct CommentCache {
    posted: RwLock<HashSet<(String, String)>>,
}

impl CommentCache {
    /// Record a comment about to be staged. Returns `false` when an
    /// identical comment was already recorded for this issue.
    pub async fn check_and_record(&self, issue_key: &str, body: &str) -> bool {
        self.posted
            .write()
            .await
            .insert((issue_key.to_string(), body.to_string()))
    }

    pub async fn flush(&self) {
        self.posted.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(key: &str) -> ProjectMeta {
        ProjectMeta {
            key: key.to_string(),
            name: key.to_string(),
            private: false,
        }
    }

    #[tokio::test]
    async fn test_project_cache_roundtrip() {
        let cache = ProjectCache::default();
        assert!(cache.get("MC").await.is_none());

        cache.put(meta("MC")).await;
        assert_eq!(cache.get("MC").await.unwrap().key, "MC");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_comment_cache_dedupes() {
        let cache = CommentCache::default();
        assert!(cache.check_and_record("MC-1", "please add logs").await);
        assert!(!cache.check_and_record("MC-1", "please add logs").await);

        // Different issue or body is not a duplicate
        assert!(cache.check_and_record("MC-2", "please add logs").await);
        assert!(cache.check_and_record("MC-1", "other text").await);
    }

    #[tokio::test]
    async fn test_flush_all_clears_both() {
        let caches = RunCaches::new();
        caches.projects.put(meta("MC")).await;
        caches.comments.check_and_record("MC-1", "hi").await;

        caches.flush_all().await;

        assert!(caches.projects.is_empty().await);
        assert!(caches.comments.check_and_record("MC-1", "hi").await);
    }
}
