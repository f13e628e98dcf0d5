//! Execution pipeline integration tests.
//!
//! These tests drive full runs through `Executor::execute` against the
//! mock tracker: module dispatch, deferred commits, failure isolation
//! and the one-retry-then-drop policy across consecutive runs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use ticketron_core::{
    config::DebugConfig,
    issue::{Issue, Timeframe},
    registry::{ModuleError, ModuleRegistry, TriageModule},
    testing::{fixtures, MockTracker},
    tracker::TrackerApi,
    Executor, RunCaches, UpdateContext,
};

/// What a scripted module stages when it runs.
enum Action {
    Nothing,
    Edit(&'static str, Value),
    Transition(&'static str),
    Fail,
}

/// Test module with a fixed predicate outcome and call counters.
struct ScriptedModule {
    name: &'static str,
    matches: bool,
    action: Action,
    predicate_calls: AtomicUsize,
    action_calls: AtomicUsize,
}

impl ScriptedModule {
    fn new(name: &'static str, matches: bool, action: Action) -> Arc<Self> {
        Arc::new(Self {
            name,
            matches,
            action,
            predicate_calls: AtomicUsize::new(0),
            action_calls: AtomicUsize::new(0),
        })
    }

    fn predicate_calls(&self) -> usize {
        self.predicate_calls.load(Ordering::SeqCst)
    }

    fn action_calls(&self) -> usize {
        self.action_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TriageModule for ScriptedModule {
    fn name(&self) -> &str {
        self.name
    }

    fn applies(&self, _issue: &Issue) -> bool {
        self.predicate_calls.fetch_add(1, Ordering::SeqCst);
        self.matches
    }

    async fn run(
        &self,
        issue: &Issue,
        ctx: &mut UpdateContext,
        _timeframe: &Timeframe,
    ) -> Result<(), ModuleError> {
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        match &self.action {
            Action::Nothing => {}
            Action::Edit(field, value) => ctx.stage_edit(*field, value.clone()),
            Action::Transition(name) => {
                let _ = ctx.stage_transition(*name);
            }
            Action::Fail => {
                return Err(ModuleError::Failed(format!(
                    "scripted failure on {}",
                    issue.key
                )))
            }
        }
        Ok(())
    }
}

struct TestHarness {
    tracker: Arc<MockTracker>,
    caches: Arc<RunCaches>,
}

impl TestHarness {
    async fn with_issues(keys: &[&str]) -> Self {
        let tracker = Arc::new(MockTracker::new());
        tracker
            .set_search_issues(keys.iter().map(|k| fixtures::raw_issue(k).build()).collect())
            .await;
        Self {
            tracker,
            caches: Arc::new(RunCaches::new()),
        }
    }

    fn executor(&self, registries: Vec<ModuleRegistry>) -> Executor {
        Executor::new(
            DebugConfig::default(),
            registries,
            self.tracker.clone() as Arc<dyn TrackerApi>,
            Arc::clone(&self.caches),
        )
    }
}

fn registry_with(modules: Vec<(bool, Arc<ScriptedModule>)>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new("test", "project = X");
    for (enabled, module) in modules {
        registry = registry.with_module(enabled, module as Arc<dyn TriageModule>);
    }
    registry
}

fn timeframe() -> Timeframe {
    let end = Utc::now();
    Timeframe::new(end - Duration::minutes(1), end)
}

#[tokio::test]
async fn test_disabled_module_is_never_consulted() {
    let harness = TestHarness::with_issues(&["X-1", "X-2"]).await;
    let enabled = ScriptedModule::new("m_on", true, Action::Nothing);
    let disabled = ScriptedModule::new("m_off", true, Action::Nothing);

    let executor = harness.executor(vec![registry_with(vec![
        (true, Arc::clone(&enabled)),
        (false, Arc::clone(&disabled)),
    ])]);
    let result = executor.execute(&timeframe(), &HashSet::new()).await;

    assert!(result.successful);
    assert_eq!(enabled.predicate_calls(), 2);
    assert_eq!(disabled.predicate_calls(), 0);
    assert_eq!(disabled.action_calls(), 0);
}

#[tokio::test]
async fn test_clean_contexts_commit_without_tracker_calls() {
    let harness = TestHarness::with_issues(&["X-1"]).await;
    let module = ScriptedModule::new("noop", true, Action::Nothing);

    let executor = harness.executor(vec![registry_with(vec![(true, Arc::clone(&module))])]);
    let result = executor.execute(&timeframe(), &HashSet::new()).await;

    assert!(result.successful);
    assert_eq!(module.action_calls(), 1);
    assert_eq!(harness.tracker.mutation_count().await, 0);
}

#[tokio::test]
async fn test_staged_edit_is_applied_once() {
    let harness = TestHarness::with_issues(&["X-1"]).await;
    let staging = ScriptedModule::new("m1", true, Action::Edit("priority", json!("High")));
    let passing = ScriptedModule::new("m2", false, Action::Fail);

    let executor = harness.executor(vec![registry_with(vec![
        (true, Arc::clone(&staging)),
        (true, Arc::clone(&passing)),
    ])]);
    let result = executor.execute(&timeframe(), &HashSet::new()).await;

    assert!(result.successful);
    assert!(result.failed_tickets.is_empty());
    // The non-applying module's action never ran
    assert_eq!(passing.action_calls(), 0);

    let edits = harness.tracker.edits().await;
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].0, "X-1");
    assert_eq!(edits[0].1["priority"], json!("High"));
}

#[tokio::test]
async fn test_first_staged_transition_wins() {
    let harness = TestHarness::with_issues(&["X-1"]).await;
    let first = ScriptedModule::new("m1", true, Action::Transition("Resolve Issue"));
    let second = ScriptedModule::new("m2", true, Action::Transition("Reopen Issue"));

    let executor = harness.executor(vec![registry_with(vec![
        (true, first),
        (true, Arc::clone(&second)),
    ])]);
    let result = executor.execute(&timeframe(), &HashSet::new()).await;

    assert!(result.successful);
    assert_eq!(second.action_calls(), 1);

    let transitions = harness.tracker.transitions().await;
    assert_eq!(
        transitions,
        vec![("X-1".to_string(), "Resolve Issue".to_string())]
    );
}

#[tokio::test]
async fn test_module_failure_skips_commit_for_that_issue() {
    let harness = TestHarness::with_issues(&["X-1", "X-2"]).await;
    let staging = ScriptedModule::new("m1", true, Action::Edit("priority", json!("High")));
    let failing = ScriptedModule::new("m2", true, Action::Fail);

    let executor = harness.executor(vec![registry_with(vec![
        (true, staging),
        (true, failing),
    ])]);
    let result = executor.execute(&timeframe(), &HashSet::new()).await;

    // Both issues failed; nothing staged on them reached the tracker
    assert!(result.successful);
    assert_eq!(
        result.failed_tickets,
        HashSet::from(["X-1".to_string(), "X-2".to_string()])
    );
    assert_eq!(harness.tracker.mutation_count().await, 0);
}

#[tokio::test]
async fn test_failure_on_retried_issue_drops_it() {
    let harness = TestHarness::with_issues(&["X-1"]).await;
    let failing = ScriptedModule::new("m1", true, Action::Fail);

    let executor = harness.executor(vec![registry_with(vec![(true, failing)])]);

    let retry: HashSet<String> = ["X-1".to_string()].into();
    let result = executor.execute(&timeframe(), &retry).await;

    assert!(result.successful);
    assert!(result.failed_tickets.is_empty());
}

#[tokio::test]
async fn test_retry_keys_reach_the_query() {
    let harness = TestHarness::with_issues(&[]).await;
    let module = ScriptedModule::new("m1", true, Action::Nothing);

    let executor = harness.executor(vec![registry_with(vec![(true, module)])]);
    let retry: HashSet<String> = ["X-9".to_string()].into();
    executor.execute(&timeframe(), &retry).await;

    let searches = harness.tracker.searches().await;
    assert_eq!(searches.len(), 1);
    assert!(searches[0].jql.contains("OR key in (X-9)"));
}

#[tokio::test]
async fn test_commit_failure_marks_issue_failed() {
    let harness = TestHarness::with_issues(&["X-1", "X-2"]).await;
    harness.tracker.fail_edits_for("X-1").await;
    let staging = ScriptedModule::new("m1", true, Action::Edit("priority", json!("High")));

    let executor = harness.executor(vec![registry_with(vec![(true, staging)])]);
    let result = executor.execute(&timeframe(), &HashSet::new()).await;

    assert!(result.successful);
    assert_eq!(result.failed_tickets, HashSet::from(["X-1".to_string()]));

    // The other issue's commit still went through
    let edits = harness.tracker.edits().await;
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].0, "X-2");
}

#[tokio::test]
async fn test_transport_error_aborts_run_and_flushes_caches() {
    let harness = TestHarness::with_issues(&["X-1"]).await;
    harness
        .tracker
        .fail_next_search(ticketron_core::TrackerError::Timeout)
        .await;
    let module = ScriptedModule::new("m1", true, Action::Nothing);

    // Seed the project cache so the flush is observable
    harness
        .caches
        .projects
        .put(ticketron_core::issue::ProjectMeta {
            key: "X".to_string(),
            name: "X".to_string(),
            private: false,
        })
        .await;

    let executor = harness.executor(vec![registry_with(vec![(true, module)])]);
    let result = executor.execute(&timeframe(), &HashSet::new()).await;

    assert!(!result.successful);
    assert!(harness.caches.projects.is_empty().await);
}

#[tokio::test]
async fn test_caches_flushed_between_runs() {
    let harness = TestHarness::with_issues(&["X-1"]).await;
    let module = ScriptedModule::new("m1", true, Action::Nothing);

    let executor = harness.executor(vec![registry_with(vec![(true, module)])]);
    executor.execute(&timeframe(), &HashSet::new()).await;

    // One run fetched project metadata once and then flushed it
    assert_eq!(harness.tracker.project_fetches().await, 1);
    assert!(harness.caches.projects.is_empty().await);

    executor.execute(&timeframe(), &HashSet::new()).await;
    assert_eq!(harness.tracker.project_fetches().await, 2);
}

#[tokio::test]
async fn test_second_registry_still_runs() {
    let harness = TestHarness::with_issues(&["X-1"]).await;
    let first = ScriptedModule::new("m1", true, Action::Nothing);
    let second = ScriptedModule::new("m2", true, Action::Nothing);

    let executor = harness.executor(vec![
        registry_with(vec![(true, Arc::clone(&first))]),
        registry_with(vec![(true, Arc::clone(&second))]),
    ]);
    executor.execute(&timeframe(), &HashSet::new()).await;

    assert_eq!(first.action_calls(), 1);
    assert_eq!(second.action_calls(), 1);
    // One paginated search per registry
    assert_eq!(harness.tracker.searches().await.len(), 2);
}
