//! Per-issue deferred mutation accumulator.
//!
//! Modules stage edits, at most one transition, and auxiliary operations
//! here instead of mutating the tracker directly. The whole context is
//! committed as one unit after every module of a registry has run over
//! the issue, and discarded afterwards; it is never reused across issues
//! or runs.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::tracker::TrackerApi;

/// A transition was already staged; later requests lose (first writer wins).
#[derive(Debug, Clone, Error)]
#[error("transition `{staged}` already staged on {key}, rejected `{rejected}`")]
pub struct TransitionConflict {
    pub key: String,
    pub staged: String,
    pub rejected: String,
}

/// Commit failed for at least one staged operation.
#[derive(Debug, Clone, Error)]
#[error("commit for {key} failed {failed} of {attempted} operations: {first}")]
pub struct CommitError {
    pub key: String,
    pub failed: usize,
    pub attempted: usize,
    /// Description of the first failure, for logging.
    pub first: String,
}

/// An auxiliary side-effecting operation, independently fallible at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuxOp {
    /// Post a comment on the issue.
    Comment { body: String },
}

/// Write-deferred accumulator for one issue within one run.
#[derive(Debug)]
pub struct UpdateContext {
    key: String,
    edits: BTreeMap<String, Value>,
    transition: Option<String>,
    aux_ops: Vec<AuxOp>,
    has_edits: bool,
    has_updates: bool,
}

impl UpdateContext {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            edits: BTreeMap::new(),
            transition: None,
            aux_ops: Vec::new(),
            has_edits: false,
            has_updates: false,
        }
    }

    pub fn issue_key(&self) -> &str {
        &self.key
    }

    /// Stage a field edit. Last write wins per field.
    pub fn stage_edit(&mut self, field: impl Into<String>, value: Value) {
        self.edits.insert(field.into(), value);
        self.has_edits = true;
    }

    /// Stage a workflow transition. The first staged transition wins;
    /// later requests are rejected as conflicts and change nothing.
    pub fn stage_transition(
        &mut self,
        transition: impl Into<String>,
    ) -> Result<(), TransitionConflict> {
        let transition = transition.into();
        match &self.transition {
            Some(staged) => Err(TransitionConflict {
                key: self.key.clone(),
                staged: staged.clone(),
                rejected: transition,
            }),
            None => {
                self.transition = Some(transition);
                self.has_updates = true;
                Ok(())
            }
        }
    }

    /// Stage a comment post as an auxiliary operation.
    pub fn stage_comment(&mut self, body: impl Into<String>) {
        self.aux_ops.push(AuxOp::Comment { body: body.into() });
    }

    pub fn staged_edits(&self) -> &BTreeMap<String, Value> {
        &self.edits
    }

    pub fn staged_transition(&self) -> Option<&str> {
        self.transition.as_deref()
    }

    pub fn staged_aux_ops(&self) -> &[AuxOp] {
        &self.aux_ops
    }

    /// Whether a commit would perform any tracker call.
    pub fn is_dirty(&self) -> bool {
        self.has_edits || self.has_updates || !self.aux_ops.is_empty()
    }

    /// Apply everything staged to the tracker: edits as one batched update,
    /// then the transition, then each auxiliary operation in staged order.
    /// A clean context commits as a no-op without any network call.
    ///
    /// Individual failures do not stop the remaining operations; partial
    /// application is possible and the error reports the issue as failed.
    pub async fn commit(self, tracker: &dyn TrackerApi) -> Result<(), CommitError> {
        if !self.is_dirty() {
            return Ok(());
        }

        let mut attempted = 0;
        let mut errors: Vec<String> = Vec::new();

        if self.has_edits {
            attempted += 1;
            if let Err(e) = tracker.edit_issue(&self.key, &self.edits).await {
                warn!(issue = %self.key, error = %e, "Failed to apply staged edits");
                errors.push(format!("edit: {}", e));
            }
        }

        if let Some(transition) = &self.transition {
            attempted += 1;
            if let Err(e) = tracker.transition_issue(&self.key, transition).await {
                warn!(
                    issue = %self.key,
                    transition = %transition,
                    error = %e,
                    "Failed to apply staged transition"
                );
                errors.push(format!("transition `{}`: {}", transition, e));
            }
        }

        for op in &self.aux_ops {
            attempted += 1;
            let result = match op {
                AuxOp::Comment { body } => tracker.add_comment(&self.key, body).await,
            };
            if let Err(e) = result {
                warn!(issue = %self.key, error = %e, "Auxiliary operation failed");
                errors.push(format!("aux: {}", e));
            }
        }

        match errors.first() {
            None => Ok(()),
            Some(first) => Err(CommitError {
                key: self.key,
                failed: errors.len(),
                attempted,
                first: first.clone(),
            }),
        }
    }
}
