//! Core scheduling abstractions and quota accounting.

pub mod error;
pub mod executor;
pub mod retry;
pub mod scheduler;
pub mod stats;
pub mod task;
pub mod window;

pub use error::{AppResult, ConfigError, SchedulerError, TaskError};
pub use executor::{Spawn, TaskOperation};
pub use retry::{Backoff, RetryPolicy, RetryState};
pub use scheduler::{RateLimitedScheduler, SchedulerLimits};
pub use stats::SchedulerStats;
pub use task::{TaskHandle, TaskId};
pub use window::CompletionWindow;
