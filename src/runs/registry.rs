//! Shared registry of in-flight runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

/// Lifecycle state of a tracked run.
///
/// `Cancelled` is transient: it only exists between a cancel request and
/// the poll loop's next tick, which reaps the entry. Terminal outcomes
/// (completed, failed) are signaled by removal, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The poll loop is driving this run.
    Running,
    /// A caller asked for cancellation; the poll loop has not yet observed it.
    Cancelled,
}

/// Registry record for one run.
#[derive(Debug, Clone)]
pub struct RunEntry {
    /// Conversation thread the run belongs to.
    pub thread_id: String,
    /// Current lifecycle state.
    pub status: RunStatus,
    /// When the run was registered.
    pub registered_at: DateTime<Utc>,
}

/// Thread-safe mapping from run identifier to [`RunEntry`].
///
/// All access goes through whole-map mutual exclusion; no transaction spans
/// more than one registry operation. The map is the only shared mutable
/// state between a poll loop and a concurrent cancel request.
#[derive(Debug, Clone)]
pub struct RunRegistry {
    inner: Arc<RunRegistryInner>,
}

#[derive(Debug)]
struct RunRegistryInner {
    runs: RwLock<HashMap<String, RunEntry>>,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RunRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RunRegistryInner {
                runs: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Insert a new run with status [`RunStatus::Running`], making it
    /// visible to [`request_cancel`](Self::request_cancel).
    ///
    /// The remote gateway guarantees fresh run identifiers, so an existing
    /// entry under the same id is a precondition violation and is simply
    /// overwritten.
    pub fn register(&self, run_id: impl Into<String>, thread_id: impl Into<String>) {
        let mut guard = self.inner.runs.write().unwrap();
        guard.insert(
            run_id.into(),
            RunEntry {
                thread_id: thread_id.into(),
                status: RunStatus::Running,
                registered_at: Utc::now(),
            },
        );
    }

    /// Request cancellation of a run.
    ///
    /// This is a request, not an immediate stop: it flips the entry's flag,
    /// and the owning poll loop performs the remote cancel and cleanup on
    /// its next tick. Returns `false` when the run is unknown or already
    /// finished — callers must treat that as "already finished", not as a
    /// failure.
    pub fn request_cancel(&self, run_id: &str) -> bool {
        let mut guard = self.inner.runs.write().unwrap();
        match guard.get_mut(run_id) {
            Some(entry) => {
                entry.status = RunStatus::Cancelled;
                true
            }
            None => false,
        }
    }

    /// Check whether cancellation has been requested for a run.
    ///
    /// Returns `false` for absent entries; a handle to a reaped run is
    /// stale and must be treated as such.
    #[must_use]
    pub fn cancel_requested(&self, run_id: &str) -> bool {
        let guard = self.inner.runs.read().unwrap();
        guard
            .get(run_id)
            .is_some_and(|e| e.status == RunStatus::Cancelled)
    }

    /// Remove a run's entry, returning it if it was present.
    pub fn remove(&self, run_id: &str) -> Option<RunEntry> {
        let mut guard = self.inner.runs.write().unwrap();
        guard.remove(run_id)
    }

    /// Check whether a run is currently tracked.
    #[must_use]
    pub fn contains(&self, run_id: &str) -> bool {
        self.inner.runs.read().unwrap().contains_key(run_id)
    }

    /// Number of tracked runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.runs.read().unwrap().len()
    }

    /// Check whether no runs are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_cancel() {
        let registry = RunRegistry::new();
        assert!(registry.is_empty());

        registry.register("r1", "t1");
        assert!(registry.contains("r1"));
        assert!(!registry.cancel_requested("r1"));

        assert!(registry.request_cancel("r1"));
        assert!(registry.cancel_requested("r1"));
    }

    #[test]
    fn test_cancel_unknown_run() {
        let registry = RunRegistry::new();
        assert!(!registry.request_cancel("never-registered"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = RunRegistry::new();
        registry.register("r1", "t1");

        let entry = registry.remove("r1").unwrap();
        assert_eq!(entry.thread_id, "t1");
        assert!(registry.remove("r1").is_none());

        // A cancel racing with removal sees "already finished".
        assert!(!registry.request_cancel("r1"));
    }

    #[test]
    fn test_one_entry_per_run_id() {
        let registry = RunRegistry::new();
        registry.register("r1", "t1");
        registry.register("r1", "t2");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remove("r1").unwrap().thread_id, "t2");
    }

    #[test]
    fn test_cancel_requested_on_absent_entry() {
        let registry = RunRegistry::new();
        assert!(!registry.cancel_requested("r1"));
    }
}
