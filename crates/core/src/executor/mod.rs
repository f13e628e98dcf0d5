//! The execution pipeline.
//!
//! One `Executor::execute` call is one run: for every registry, pull all
//! matching issues through the search cursor, sweep every enabled module
//! over them, and commit each issue's accumulated mutations as one unit.
//! Failures are isolated per issue; only transport-level errors abort
//! the run. Caches are flushed exactly once on every exit path.

mod retry;
mod search;
mod update_context;

pub use retry::FailureTracker;
pub use search::{SearchCursor, PAGE_SIZE};
pub use update_context::{AuxOp, CommitError, TransitionConflict, UpdateContext};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::cache::RunCaches;
use crate::config::DebugConfig;
use crate::issue::{Issue, Timeframe};
use crate::registry::ModuleRegistry;
use crate::tracker::{TrackerApi, TrackerError};

/// Outcome of one run, consumed by the caller to derive the next run's
/// retry set.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// False when the run was aborted by an unexpected error.
    pub successful: bool,
    /// Keys that failed for the first time this run.
    pub failed_tickets: HashSet<String>,
}

/// Drives the registries over one run.
pub struct Executor {
    debug: DebugConfig,
    registries: Vec<ModuleRegistry>,
    tracker: Arc<dyn TrackerApi>,
    caches: Arc<RunCaches>,
}

impl Executor {
    pub fn new(
        debug: DebugConfig,
        registries: Vec<ModuleRegistry>,
        tracker: Arc<dyn TrackerApi>,
        caches: Arc<RunCaches>,
    ) -> Self {
        let enabled: Vec<String> = registries
            .iter()
            .flat_map(|r| r.enabled_modules())
            .map(|m| m.name().to_string())
            .collect();
        debug!(modules = ?enabled, "Enabled modules");

        Self {
            debug,
            registries,
            tracker,
            caches,
        }
    }

    /// Execute one run over the given timeframe and retry set.
    pub async fn execute(
        &self,
        timeframe: &Timeframe,
        retry_tickets: &HashSet<String>,
    ) -> ExecutionResult {
        debug!(%timeframe, "Executing timeframe");

        let mut failures = FailureTracker::new(retry_tickets);
        let outcome = self
            .run_registries(timeframe, retry_tickets, &mut failures)
            .await;

        // Flushed exactly once per run, on the abort path too
        self.caches.flush_all().await;

        match outcome {
            Ok(()) => ExecutionResult {
                successful: true,
                failed_tickets: failures.into_failed(),
            },
            Err(e) => {
                error!(error = %e, "Failed to execute modules");
                ExecutionResult {
                    successful: false,
                    failed_tickets: failures.into_failed(),
                }
            }
        }
    }

    async fn run_registries(
        &self,
        timeframe: &Timeframe,
        retry_tickets: &HashSet<String>,
        failures: &mut FailureTracker,
    ) -> Result<(), TrackerError> {
        for registry in &self.registries {
            self.run_registry(registry, timeframe, retry_tickets, failures)
                .await?;
        }
        Ok(())
    }

    async fn run_registry(
        &self,
        registry: &ModuleRegistry,
        timeframe: &Timeframe,
        retry_tickets: &HashSet<String>,
        failures: &mut FailureTracker,
    ) -> Result<(), TrackerError> {
        let issues = self
            .issues_for_registry(registry, timeframe, retry_tickets)
            .await?;

        let mut contexts: HashMap<String, UpdateContext> = HashMap::new();
        let mut poisoned: HashSet<String> = HashSet::new();

        for module in registry.enabled_modules() {
            debug!(module = module.name(), "Executing module");

            for issue in &issues {
                if !module.applies(issue) {
                    continue;
                }

                let ctx = contexts
                    .entry(issue.key.clone())
                    .or_insert_with(|| UpdateContext::new(issue.key.clone()));

                if let Err(e) = module.run(issue, ctx, timeframe).await {
                    warn!(
                        module = module.name(),
                        issue = %issue.key,
                        error = %e,
                        "Module failed"
                    );
                    poisoned.insert(issue.key.clone());
                    failures.record(&issue.key);
                }
            }
        }

        // Commit per issue, in fetched order, skipping issues whose
        // modules failed; their staged context is discarded.
        for issue in &issues {
            if poisoned.contains(&issue.key) {
                continue;
            }
            let Some(ctx) = contexts.remove(&issue.key) else {
                continue;
            };

            if let Err(e) = ctx.commit(self.tracker.as_ref()).await {
                warn!(issue = %issue.key, error = %e, "Commit failed");
                failures.record(&issue.key);
            }
        }

        Ok(())
    }

    async fn issues_for_registry(
        &self,
        registry: &ModuleRegistry,
        timeframe: &Timeframe,
        retry_tickets: &HashSet<String>,
    ) -> Result<Vec<Issue>, TrackerError> {
        let jql = registry.full_jql(timeframe, retry_tickets);

        if self.debug.log_query_jql {
            debug!(registry = registry.name(), jql = %jql, "Registry JQL");
        }

        let mut cursor =
            SearchCursor::new(Arc::clone(&self.tracker), Arc::clone(&self.caches), jql);
        let issues = cursor.drain().await?;

        if self.debug.log_returned_issues {
            let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
            debug!(registry = registry.name(), issues = ?keys, "Returned issues");
        } else {
            debug!(
                registry = registry.name(),
                count = issues.len(),
                "Issues returned for registry"
            );
        }

        Ok(issues)
    }
}
