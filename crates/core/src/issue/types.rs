use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while converting a wire issue into the domain snapshot.
#[derive(Debug, Error)]
pub enum IssueError {
    /// A field the domain representation requires was absent or malformed.
    #[error("issue {key} is missing required field `{field}`")]
    MissingField { key: String, field: &'static str },

    /// A timestamp could not be parsed.
    #[error("issue {key} has invalid timestamp `{value}`")]
    InvalidTimestamp { key: String, value: String },

    /// The issue key has no project prefix.
    #[error("issue key `{0}` has no project prefix")]
    MalformedKey(String),
}

/// Project metadata fetched once per project and cached for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub key: String,
    pub name: String,
    /// Whether the whole project is restricted from public view.
    pub private: bool,
}

/// One collapsed changelog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Display name of the user who made the change, when known.
    pub author: Option<String>,
    pub created: Option<DateTime<Utc>>,
    /// Name of the changed field.
    pub field: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// An immutable snapshot of a tracker issue at fetch time.
///
/// Mutations never happen in place; modules stage them on an
/// `UpdateContext` and the tracker applies them externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique stable identifier, e.g. "MC-123".
    pub key: String,
    pub project: ProjectMeta,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub resolution: Option<String>,
    pub labels: Vec<String>,
    /// Name of the applied security level, if any.
    pub security_level: Option<String>,
    /// Display name of the reporter, when known.
    pub reporter: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub attachment_count: usize,
    pub changelog: Vec<ChangelogEntry>,
}

impl Issue {
    /// Whether the issue carries no description and no attachments.
    pub fn is_empty_report(&self) -> bool {
        self.description
            .as_deref()
            .map(|d| d.trim().is_empty())
            .unwrap_or(true)
            && self.attachment_count == 0
    }
}

/// Extract the project prefix from an issue key ("MC-123" -> "MC").
pub fn project_key_of(issue_key: &str) -> Result<&str, IssueError> {
    match issue_key.split_once('-') {
        Some((project, _)) if !project.is_empty() => Ok(project),
        _ => Err(IssueError::MalformedKey(issue_key.to_string())),
    }
}
