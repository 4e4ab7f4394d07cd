//! Scheduler counters and point-in-time statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of scheduler utilisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Completions allowed per window.
    pub quota: u32,
    /// Tasks waiting for admission.
    pub queued: usize,
    /// Tasks currently executing.
    pub in_flight: usize,
    /// Completions still counted against the current window.
    pub recent_completions: usize,
    /// Whether the periodic re-check timer is running.
    pub timer_active: bool,
    /// Tasks accepted by `submit`.
    pub submitted: u64,
    /// Tasks that resolved successfully.
    pub succeeded: u64,
    /// Tasks that exhausted their attempts.
    pub failed: u64,
    /// Attempts re-run after a failure.
    pub retried: u64,
    /// Attempts that hit the per-attempt timeout.
    pub timed_out: u64,
    /// Tasks withdrawn before admission by `cancel` or `shutdown`.
    pub cancelled: u64,
}

/// Lifetime counters (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub submitted: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub retried: AtomicU64,
    pub timed_out: AtomicU64,
    pub cancelled: AtomicU64,
}

impl SchedulerCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters into `stats`.
    pub fn fill(&self, stats: &mut SchedulerStats) {
        stats.submitted = self.submitted.load(Ordering::Relaxed);
        stats.succeeded = self.succeeded.load(Ordering::Relaxed);
        stats.failed = self.failed.load(Ordering::Relaxed);
        stats.retried = self.retried.load(Ordering::Relaxed);
        stats.timed_out = self.timed_out.load(Ordering::Relaxed);
        stats.cancelled = self.cancelled.load(Ordering::Relaxed);
    }
}
