//! Wire-to-domain issue conversion.
//!
//! Conversion is per issue and fallible: a malformed ticket yields an
//! `IssueError` and is dropped by the caller, it never aborts a page.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::tracker::RawIssue;

use super::{ChangelogEntry, Issue, IssueError, ProjectMeta};

/// Convert a raw tracker issue plus its project metadata into the
/// immutable domain snapshot.
pub fn issue_from_raw(raw: &RawIssue, project: ProjectMeta) -> Result<Issue, IssueError> {
    let key = raw.key.clone();
    if key.is_empty() {
        return Err(IssueError::MalformedKey(key));
    }

    let status = raw
        .fields
        .get("status")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| IssueError::MissingField {
            key: key.clone(),
            field: "status",
        })?
        .to_string();

    let created = parse_timestamp(&raw.fields, "created", &key)?;
    let updated = parse_timestamp(&raw.fields, "updated", &key)?;

    let changelog = raw
        .changelog
        .as_ref()
        .map(|log| {
            log.histories
                .iter()
                .flat_map(|history| {
                    let author = history
                        .author
                        .as_ref()
                        .and_then(|a| a.display_name.clone());
                    let created = history
                        .created
                        .as_deref()
                        .and_then(|c| parse_jira_timestamp(c).ok());
                    history.items.iter().map(move |item| ChangelogEntry {
                        author: author.clone(),
                        created,
                        field: item.field.clone(),
                        from: item.from_string.clone(),
                        to: item.to_string.clone(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Issue {
        summary: field_str(&raw.fields, "summary"),
        description: field_str(&raw.fields, "description"),
        resolution: raw
            .fields
            .get("resolution")
            .and_then(|r| r.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        labels: raw
            .fields
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        security_level: raw
            .fields
            .get("security")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        reporter: raw
            .fields
            .get("reporter")
            .and_then(|r| r.get("displayName"))
            .and_then(Value::as_str)
            .map(str::to_string),
        attachment_count: raw
            .fields
            .get("attachment")
            .and_then(Value::as_array)
            .map(|a| a.len())
            .unwrap_or(0),
        key,
        project,
        status,
        created,
        updated,
        changelog,
    })
}

fn field_str(fields: &serde_json::Map<String, Value>, name: &str) -> Option<String> {
    fields.get(name).and_then(Value::as_str).map(str::to_string)
}

fn parse_timestamp(
    fields: &serde_json::Map<String, Value>,
    name: &'static str,
    key: &str,
) -> Result<DateTime<Utc>, IssueError> {
    let value = fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| IssueError::MissingField {
            key: key.to_string(),
            field: name,
        })?;

    parse_jira_timestamp(value).map_err(|_| IssueError::InvalidTimestamp {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parse the tracker's timestamp format, e.g. "2024-06-15T10:30:00.000+0000",
/// falling back to RFC 3339.
fn parse_jira_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
}
