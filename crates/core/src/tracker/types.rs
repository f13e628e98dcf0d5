//! Wire types and errors for the tracker API.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur when talking to the tracker.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// Request timed out.
    #[error("tracker request timed out")]
    Timeout,

    /// Could not connect to the tracker.
    #[error("failed to connect to tracker: {0}")]
    ConnectionFailed(String),

    /// Authentication or authorization failure.
    #[error("tracker rejected credentials: {0}")]
    Auth(String),

    /// The tracker returned an error response.
    #[error("tracker API error: {0}")]
    Api(String),

    /// The response body could not be decoded.
    #[error("failed to decode tracker response: {0}")]
    Decode(String),
}

/// A single page request against the tracker's search endpoint.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Opaque filter string built by the caller.
    pub jql: String,
    /// Field names to return for each issue.
    pub fields: Vec<String>,
    /// Expansions to request (e.g., "changelog").
    pub expand: Vec<String>,
    /// Page size.
    pub max_results: u32,
    /// Offset into the result set, a multiple of the page size.
    pub start_at: u64,
}

impl SearchRequest {
    /// Build the standard request the execution pipeline uses: all fields
    /// plus the changelog expansion.
    pub fn page(jql: impl Into<String>, max_results: u32, start_at: u64) -> Self {
        Self {
            jql: jql.into(),
            fields: vec!["*all".to_string()],
            expand: vec!["changelog".to_string()],
            max_results,
            start_at,
        }
    }
}

/// One page of search results as returned by the tracker.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<RawIssue>,
    /// Total number of issues matching the query.
    pub total: u64,
    /// Page size the server actually applied.
    #[serde(rename = "maxResults")]
    pub max_results: u32,
}

/// An issue exactly as the tracker serialized it. Conversion into the
/// domain representation happens per issue and may fail.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub key: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub changelog: Option<RawChangelog>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChangelog {
    #[serde(default)]
    pub histories: Vec<RawHistory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHistory {
    #[serde(default)]
    pub author: Option<RawUser>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub items: Vec<RawChangeItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChangeItem {
    pub field: String,
    #[serde(rename = "fromString")]
    pub from_string: Option<String>,
    #[serde(rename = "toString")]
    pub to_string: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    #[serde(rename = "accountId")]
    pub account_id: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_page_deserialization() {
        let json = r#"{
            "issues": [{"key": "MC-1", "fields": {"summary": "a bug"}}],
            "total": 1,
            "maxResults": 100
        }"#;
        let page: SearchPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.issues.len(), 1);
        assert_eq!(page.issues[0].key, "MC-1");
        assert_eq!(page.total, 1);
        assert_eq!(page.max_results, 100);
    }

    #[test]
    fn test_raw_issue_missing_changelog() {
        let json = r#"{"key": "MC-2", "fields": {}}"#;
        let issue: RawIssue = serde_json::from_str(json).unwrap();
        assert!(issue.changelog.is_none());
    }

    #[test]
    fn test_change_item_renames() {
        let json = r#"{"field": "status", "fromString": "Open", "toString": "Resolved"}"#;
        let item: RawChangeItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.from_string.as_deref(), Some("Open"));
        assert_eq!(item.to_string.as_deref(), Some("Resolved"));
    }

    #[test]
    fn test_search_request_page() {
        let request = SearchRequest::page("project = MC", 100, 200);
        assert_eq!(request.fields, vec!["*all"]);
        assert_eq!(request.expand, vec!["changelog"]);
        assert_eq!(request.start_at, 200);
    }
}
