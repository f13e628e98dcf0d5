//! Per-ticket failure bookkeeping across a run.

use std::collections::HashSet;
use tracing::info;

/// Records which issue keys failed during a run.
///
/// A key that was not in the incoming retry set becomes part of the
/// outgoing failed set and is eligible for one retry on the next run. A
/// key that was already being retried is logged and dropped, so each
/// ticket gets exactly one retry attempt across consecutive runs.
#[derive(Debug)]
pub struct FailureTracker {
    retry_set: HashSet<String>,
    failed: HashSet<String>,
    dropped: HashSet<String>,
}

impl FailureTracker {
    pub fn new(retry_set: &HashSet<String>) -> Self {
        Self {
            retry_set: retry_set.clone(),
            failed: HashSet::new(),
            dropped: HashSet::new(),
        }
    }

    /// Record a failed issue key, applying the one-retry-then-drop policy.
    pub fn record(&mut self, key: &str) {
        if self.retry_set.contains(key) {
            if self.dropped.insert(key.to_string()) {
                info!("{} failed to run again, dropping it", key);
            }
        } else {
            self.failed.insert(key.to_string());
        }
    }

    /// Keys recorded so far that are eligible for retry next run.
    pub fn failed_tickets(&self) -> &HashSet<String> {
        &self.failed
    }

    /// Consume the tracker into the outgoing failed set.
    pub fn into_failed(self) -> HashSet<String> {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_is_retried() {
        let mut tracker = FailureTracker::new(&HashSet::new());
        tracker.record("MC-1");

        assert!(tracker.failed_tickets().contains("MC-1"));
    }

    #[test]
    fn test_second_failure_is_dropped() {
        let retry: HashSet<String> = ["MC-1".to_string()].into();
        let mut tracker = FailureTracker::new(&retry);
        tracker.record("MC-1");

        assert!(tracker.failed_tickets().is_empty());
    }

    #[test]
    fn test_mixed_failures() {
        let retry: HashSet<String> = ["MC-1".to_string()].into();
        let mut tracker = FailureTracker::new(&retry);
        tracker.record("MC-1");
        tracker.record("MC-2");
        tracker.record("MC-2"); // duplicate report, still one entry

        assert_eq!(tracker.failed_tickets().len(), 1);
        assert!(tracker.into_failed().contains("MC-2"));
    }
}
