//! Dispatch instrumentation.
//!
//! Lock-free counters shared by every worker of one dispatch call. Totals are
//! read back only after all workers have been joined.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

/// Tracks how many traversals are running right now and the highest value
/// ever observed.
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    /// Traversals currently inside `traverse`
    active: AtomicUsize,
    /// High-water mark of `active`
    peak: AtomicUsize,
    /// Tasks spawned (workers or per-query tasks)
    tasks_launched: AtomicUsize,
    /// Traversals that ran to completion
    traversals: AtomicUsize,
}

/// RAII marker for one running traversal. Dropping it frees the gauge slot.
#[must_use = "the traversal is only counted while the guard is alive"]
pub struct ActiveTraversal {
    gauge: Arc<ConcurrencyGauge>,
}

impl ConcurrencyGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark a traversal as running.
    pub fn enter(self: &Arc<Self>) -> ActiveTraversal {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ActiveTraversal {
            gauge: Arc::clone(self),
        }
    }

    pub fn task_launched(&self) {
        self.tasks_launched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn tasks_launched(&self) -> usize {
        self.tasks_launched.load(Ordering::Relaxed)
    }

    pub fn traversals(&self) -> usize {
        self.traversals.load(Ordering::Relaxed)
    }
}

impl Drop for ActiveTraversal {
    fn drop(&mut self) {
        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
        self.gauge.traversals.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of one dispatch call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Queries handed in by the caller, duplicates included
    pub queries_submitted: usize,
    /// Queries actually admitted after duplicate handling
    pub queries_admitted: usize,
    pub tasks_launched: usize,
    pub traversals_completed: usize,
    /// Highest number of traversals observed running at once
    pub peak_active: usize,
    pub elapsed: Duration,
}

impl DispatchStats {
    pub(crate) fn from_gauge(
        gauge: &ConcurrencyGauge,
        queries_submitted: usize,
        queries_admitted: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            queries_submitted,
            queries_admitted,
            tasks_launched: gauge.tasks_launched(),
            traversals_completed: gauge.traversals(),
            peak_active: gauge.peak(),
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_active_and_peak() {
        let gauge = ConcurrencyGauge::new();
        let a = gauge.enter();
        let b = gauge.enter();
        assert_eq!(gauge.active(), 2);
        drop(a);
        let c = gauge.enter();
        assert_eq!(gauge.active(), 2);
        drop(b);
        drop(c);
        assert_eq!(gauge.active(), 0);
        assert_eq!(gauge.peak(), 2);
        assert_eq!(gauge.traversals(), 3);
    }

    #[test]
    fn stats_snapshot() {
        let gauge = ConcurrencyGauge::new();
        gauge.task_launched();
        drop(gauge.enter());
        let stats = DispatchStats::from_gauge(&gauge, 3, 1, Duration::from_millis(5));
        assert_eq!(stats.queries_submitted, 3);
        assert_eq!(stats.queries_admitted, 1);
        assert_eq!(stats.tasks_launched, 1);
        assert_eq!(stats.traversals_completed, 1);
        assert_eq!(stats.peak_active, 1);
    }
}
