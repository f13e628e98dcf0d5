//! Rule module abstraction and registries.
//!
//! A registry is a named, ordered collection of rule modules sharing a
//! base query filter. Enablement is resolved once at construction from
//! configuration and never changes during a run.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::RunCaches;
use crate::config::Config;
use crate::executor::UpdateContext;
use crate::issue::{Issue, Timeframe};
use crate::modules::{EmptyReport, KeepPrivate, ReopenClarification};

/// Failure raised by a module action; isolated per issue by the coordinator.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("tracker error: {0}")]
    Tracker(#[from] crate::tracker::TrackerError),

    #[error("{0}")]
    Failed(String),
}

/// One triage rule: a predicate over an issue plus an action staging
/// mutations on the issue's update context.
#[async_trait]
pub trait TriageModule: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this module wants to act on the issue.
    fn applies(&self, issue: &Issue) -> bool;

    /// Stage this module's mutations for the issue. Only invoked when
    /// `applies` returned true.
    async fn run(
        &self,
        issue: &Issue,
        ctx: &mut UpdateContext,
        timeframe: &Timeframe,
    ) -> Result<(), ModuleError>;
}

struct RegisteredModule {
    enabled: bool,
    module: Arc<dyn TriageModule>,
}

/// A named group of modules sharing a base query filter.
pub struct ModuleRegistry {
    name: String,
    base_jql: String,
    modules: Vec<RegisteredModule>,
}

impl ModuleRegistry {
    pub fn new(name: impl Into<String>, base_jql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_jql: base_jql.into(),
            modules: Vec::new(),
        }
    }

    /// Register a module. Registration order is execution order.
    pub fn with_module(mut self, enabled: bool, module: Arc<dyn TriageModule>) -> Self {
        self.modules.push(RegisteredModule { enabled, module });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enabled modules in registration order. Disabled modules are
    /// excluded entirely; their predicates are never evaluated.
    pub fn enabled_modules(&self) -> Vec<Arc<dyn TriageModule>> {
        self.modules
            .iter()
            .filter(|m| m.enabled)
            .map(|m| Arc::clone(&m.module))
            .collect()
    }

    /// Combine the base filter with the time window and the retry set.
    /// Retried issues bypass the time-window filter.
    pub fn full_jql(&self, timeframe: &Timeframe, retry_keys: &HashSet<String>) -> String {
        if retry_keys.is_empty() {
            return format!("({}) AND ({})", self.base_jql, timeframe.jql_fragment());
        }

        let mut keys: Vec<&str> = retry_keys.iter().map(String::as_str).collect();
        keys.sort_unstable();

        format!(
            "({}) AND (({}) OR key in ({}))",
            self.base_jql,
            timeframe.jql_fragment(),
            keys.join(", ")
        )
    }
}

/// Build the built-in registries from static configuration.
pub fn build_registries(config: &Config, caches: Arc<RunCaches>) -> Vec<ModuleRegistry> {
    let modules = &config.modules;

    let triage = ModuleRegistry::new("triage", "resolution = Unresolved")
        .with_module(
            modules.empty_report.enabled,
            Arc::new(EmptyReport::new(
                modules.empty_report.clone(),
                Arc::clone(&caches),
            )),
        )
        .with_module(
            modules.keep_private.enabled,
            Arc::new(KeepPrivate::new(modules.keep_private.clone())),
        );

    let followup = ModuleRegistry::new(
        "followup",
        format!(
            "resolution = \"{}\"",
            modules.reopen_clarification.awaiting_resolution
        ),
    )
    .with_module(
        modules.reopen_clarification.enabled,
        Arc::new(ReopenClarification::new(
            modules.reopen_clarification.clone(),
        )),
    );

    vec![triage, followup]
}
