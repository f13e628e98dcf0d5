//! Resolves reports that arrive with no description and no attachments.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::cache::RunCaches;
use crate::config::EmptyReportConfig;
use crate::executor::UpdateContext;
use crate::issue::{Issue, Timeframe};
use crate::registry::{ModuleError, TriageModule};

pub struct EmptyReport {
    config: EmptyReportConfig,
    caches: Arc<RunCaches>,
}

impl EmptyReport {
    pub fn new(config: EmptyReportConfig, caches: Arc<RunCaches>) -> Self {
        Self { config, caches }
    }
}

#[async_trait]
impl TriageModule for EmptyReport {
    fn name(&self) -> &str {
        "empty_report"
    }

    fn applies(&self, issue: &Issue) -> bool {
        issue.resolution.is_none() && issue.is_empty_report()
    }

    async fn run(
        &self,
        issue: &Issue,
        ctx: &mut UpdateContext,
        _timeframe: &Timeframe,
    ) -> Result<(), ModuleError> {
        if self
            .caches
            .comments
            .check_and_record(&issue.key, &self.config.message)
            .await
        {
            ctx.stage_comment(&self.config.message);
        } else {
            debug!(issue = %issue.key, "Helper comment already posted, skipping");
        }

        ctx.stage_edit("resolution", json!({ "name": self.config.resolution }));
        if let Err(conflict) = ctx.stage_transition("Resolve Issue") {
            debug!(issue = %issue.key, %conflict, "Transition already staged");
        }

        Ok(())
    }
}
