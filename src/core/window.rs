//! Trailing record of task completions used for quota accounting.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Completion instants inside a sliding window of fixed length.
///
/// Instants must be recorded in non-decreasing order; pruning walks from the
/// oldest entry and stops at the first one still inside the window. The
/// window is half-open, so an entry exactly `length` old no longer counts.
#[derive(Debug, Clone)]
pub struct CompletionWindow {
    length: Duration,
    completions: VecDeque<Instant>,
}

impl CompletionWindow {
    /// Empty window of the given length.
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            completions: VecDeque::new(),
        }
    }

    /// Record a completion at `at`.
    pub fn record(&mut self, at: Instant) {
        debug_assert!(
            self.completions.back().is_none_or(|last| *last <= at),
            "completions must be recorded in order"
        );
        self.completions.push_back(at);
    }

    /// Drop entries that fell out of the window and return how many remain.
    pub fn prune(&mut self, now: Instant) -> usize {
        while let Some(oldest) = self.completions.front() {
            if now.saturating_duration_since(*oldest) >= self.length {
                self.completions.pop_front();
            } else {
                break;
            }
        }
        self.completions.len()
    }

    /// Instant at which the oldest held entry leaves the window.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.completions.front().map(|oldest| *oldest + self.length)
    }
}
