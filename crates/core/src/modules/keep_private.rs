//! Restores the security level on issues marked as staff-private.

use async_trait::async_trait;
use serde_json::json;

use crate::config::KeepPrivateConfig;
use crate::executor::UpdateContext;
use crate::issue::{Issue, Timeframe};
use crate::registry::{ModuleError, TriageModule};

pub struct KeepPrivate {
    config: KeepPrivateConfig,
}

impl KeepPrivate {
    pub fn new(config: KeepPrivateConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TriageModule for KeepPrivate {
    fn name(&self) -> &str {
        "keep_private"
    }

    fn applies(&self, issue: &Issue) -> bool {
        issue.labels.iter().any(|l| l == &self.config.label) && issue.security_level.is_none()
    }

    async fn run(
        &self,
        _issue: &Issue,
        ctx: &mut UpdateContext,
        _timeframe: &Timeframe,
    ) -> Result<(), ModuleError> {
        ctx.stage_edit("security", json!({ "name": self.config.security_level }));
        Ok(())
    }
}
