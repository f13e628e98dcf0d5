//! Reopens awaiting-response issues once the reporter comes back.

use async_trait::async_trait;
use tracing::debug;

use crate::config::ReopenClarificationConfig;
use crate::executor::UpdateContext;
use crate::issue::{Issue, Timeframe};
use crate::registry::{ModuleError, TriageModule};

pub struct ReopenClarification {
    config: ReopenClarificationConfig,
}

impl ReopenClarification {
    pub fn new(config: ReopenClarificationConfig) -> Self {
        Self { config }
    }

    /// Whether the reporter was active after the issue was put into the
    /// awaiting state. When the changelog carries no resolution change
    /// the registry's time window is trusted instead.
    fn reporter_responded(issue: &Issue) -> bool {
        let Some(reporter) = issue.reporter.as_deref() else {
            return false;
        };

        let resolved_at = issue
            .changelog
            .iter()
            .rev()
            .find(|entry| entry.field == "resolution")
            .and_then(|entry| entry.created);

        match resolved_at {
            Some(resolved_at) => issue.changelog.iter().any(|entry| {
                entry.author.as_deref() == Some(reporter)
                    && entry.created.map(|c| c > resolved_at).unwrap_or(false)
            }),
            None => true,
        }
    }
}

#[async_trait]
impl TriageModule for ReopenClarification {
    fn name(&self) -> &str {
        "reopen_clarification"
    }

    fn applies(&self, issue: &Issue) -> bool {
        issue.resolution.as_deref() == Some(self.config.awaiting_resolution.as_str())
            && Self::reporter_responded(issue)
    }

    async fn run(
        &self,
        issue: &Issue,
        ctx: &mut UpdateContext,
        _timeframe: &Timeframe,
    ) -> Result<(), ModuleError> {
        if let Err(conflict) = ctx.stage_transition("Reopen Issue") {
            debug!(issue = %issue.key, %conflict, "Transition already staged");
        }
        Ok(())
    }
}
