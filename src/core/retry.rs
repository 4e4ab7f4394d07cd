//! Bounded retry policy and the per-task attempt state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

const fn default_max_attempts() -> u32 {
    3
}

/// Delay inserted between a failed attempt and the next one.
///
/// Every variant takes `failed` (the number of attempts that have failed so
/// far, starting at 1) and yields the pause before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry straight away.
    Immediate,
    /// Same pause every time.
    Fixed {
        /// Pause in milliseconds.
        delay_ms: u64,
    },
    /// `initial + step * (failed - 1)`.
    Linear {
        /// First pause in milliseconds.
        initial_ms: u64,
        /// Increment per further failure in milliseconds.
        step_ms: u64,
    },
    /// `initial * factor^(failed - 1)`, capped at `max`.
    Exponential {
        /// First pause in milliseconds.
        initial_ms: u64,
        /// Growth factor per failure.
        factor: u32,
        /// Upper bound in milliseconds.
        max_ms: u64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            initial_ms: 500,
            step_ms: 500,
        }
    }
}

impl Backoff {
    /// Pause before the attempt following the `failed`-th failure.
    pub fn delay(&self, failed: u32) -> Duration {
        let n = failed.saturating_sub(1);
        let ms = match *self {
            Self::Immediate => 0,
            Self::Fixed { delay_ms } => delay_ms,
            Self::Linear {
                initial_ms,
                step_ms,
            } => initial_ms.saturating_add(step_ms.saturating_mul(u64::from(n))),
            Self::Exponential {
                initial_ms,
                factor,
                max_ms,
            } => {
                let growth = u64::from(factor).checked_pow(n).unwrap_or(u64::MAX);
                initial_ms.saturating_mul(growth).min(max_ms)
            }
        };
        Duration::from_millis(ms)
    }
}

/// Where a task stands in its retry lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Admitted, first attempt not yet made.
    Pending,
    /// A previous attempt failed; `attempt` is the number of the next one.
    Retrying {
        /// 1-based number of the upcoming attempt.
        attempt: u32,
    },
    /// An attempt succeeded.
    Succeeded {
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// Attempts are exhausted.
    FailedFinal {
        /// Attempts made.
        attempts: u32,
    },
}

impl RetryState {
    /// Number of the attempt to run next, or `None` once terminal.
    pub const fn next_attempt(self) -> Option<u32> {
        match self {
            Self::Pending => Some(1),
            Self::Retrying { attempt } => Some(attempt),
            Self::Succeeded { .. } | Self::FailedFinal { .. } => None,
        }
    }

    /// Whether no further attempt will be made.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::FailedFinal { .. })
    }
}

/// Maximum attempts per task and the pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Pause between attempts.
    #[serde(default)]
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// Policy allowing `max_attempts` attempts with the given backoff.
    pub const fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Single attempt, failures surface immediately.
    pub const fn no_retry() -> Self {
        Self::new(1, Backoff::Immediate)
    }

    /// Validate policy values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be greater than 0".into(),
            ));
        }
        if let Backoff::Exponential { factor: 0, .. } = self.backoff {
            return Err(ConfigError::InvalidRetry(
                "exponential factor must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// State after attempt number `attempt` failed.
    pub const fn on_failure(&self, attempt: u32) -> RetryState {
        if attempt < self.max_attempts {
            RetryState::Retrying {
                attempt: attempt + 1,
            }
        } else {
            RetryState::FailedFinal { attempts: attempt }
        }
    }

    /// Pause before the attempt following the `failed`-th failure.
    pub fn delay(&self, failed: u32) -> Duration {
        self.backoff.delay(failed)
    }
}
