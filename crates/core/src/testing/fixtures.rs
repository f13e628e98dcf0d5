//! Shared fixtures for unit and integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::issue::{ChangelogEntry, Issue, ProjectMeta, Timeframe};
use crate::tracker::{RawChangeItem, RawChangelog, RawHistory, RawIssue, RawUser};

/// Builder for a wire issue with the required fields prefilled.
pub struct RawIssueBuilder {
    key: String,
    fields: Map<String, Value>,
    histories: Vec<RawHistory>,
}

/// Start building a wire issue. Defaults to an open, empty report.
pub fn raw_issue(key: &str) -> RawIssueBuilder {
    let mut fields = Map::new();
    fields.insert("summary".to_string(), json!("a bug"));
    fields.insert("status".to_string(), json!({ "name": "Open" }));
    fields.insert("created".to_string(), json!("2024-06-15T10:30:00.000+0000"));
    fields.insert("updated".to_string(), json!("2024-06-15T10:30:00.000+0000"));
    fields.insert("reporter".to_string(), json!({ "displayName": "Reporter" }));
    fields.insert("labels".to_string(), json!([]));

    RawIssueBuilder {
        key: key.to_string(),
        fields,
        histories: Vec::new(),
    }
}

impl RawIssueBuilder {
    pub fn summary(mut self, summary: &str) -> Self {
        self.fields.insert("summary".to_string(), json!(summary));
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.fields
            .insert("description".to_string(), json!(description));
        self
    }

    pub fn labels(mut self, labels: &[&str]) -> Self {
        self.fields.insert("labels".to_string(), json!(labels));
        self
    }

    pub fn resolution(mut self, name: &str) -> Self {
        self.fields
            .insert("resolution".to_string(), json!({ "name": name }));
        self
    }

    pub fn attachments(mut self, count: usize) -> Self {
        let entries: Vec<Value> = (0..count).map(|i| json!({ "id": i })).collect();
        self.fields.insert("attachment".to_string(), json!(entries));
        self
    }

    /// Append a status change to the issue's changelog.
    pub fn status_change(mut self, author: &str, from: &str, to: &str) -> Self {
        self.histories.push(RawHistory {
            author: Some(RawUser {
                account_id: None,
                display_name: Some(author.to_string()),
            }),
            created: Some("2024-06-15T12:00:00.000+0000".to_string()),
            items: vec![RawChangeItem {
                field: "status".to_string(),
                from_string: Some(from.to_string()),
                to_string: Some(to.to_string()),
            }],
        });
        self
    }

    pub fn build(self) -> RawIssue {
        let changelog = if self.histories.is_empty() {
            None
        } else {
            Some(RawChangelog {
                histories: self.histories,
            })
        };
        RawIssue {
            key: self.key,
            fields: self.fields,
            changelog,
        }
    }
}

/// A domain issue defaulting to an open, unresolved empty report.
pub fn issue(key: &str) -> Issue {
    let created = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
    let project_key = key.split_once('-').map(|(p, _)| p).unwrap_or("MC");

    Issue {
        key: key.to_string(),
        project: ProjectMeta {
            key: project_key.to_string(),
            name: project_key.to_string(),
            private: false,
        },
        summary: Some("a bug".to_string()),
        description: None,
        status: "Open".to_string(),
        resolution: None,
        labels: Vec::new(),
        security_level: None,
        reporter: Some("Reporter".to_string()),
        created,
        updated: created,
        attachment_count: 0,
        changelog: Vec::new(),
    }
}

/// A changelog entry authored at the given instant.
pub fn changelog_entry(author: &str, field: &str, created: DateTime<Utc>) -> ChangelogEntry {
    ChangelogEntry {
        author: Some(author.to_string()),
        created: Some(created),
        field: field.to_string(),
        from: None,
        to: None,
    }
}

/// An hour-long timeframe ending now.
pub fn timeframe() -> Timeframe {
    let end = Utc::now();
    Timeframe {
        start: end - Duration::hours(1),
        end,
    }
}
