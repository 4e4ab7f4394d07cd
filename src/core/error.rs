//! Error types for scheduler operations.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while building a scheduler from its configuration.
///
/// These are fatal: no scheduler instance is produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Quota must admit at least one task per window.
    #[error("quota must be greater than 0")]
    ZeroQuota,
    /// Window string is not `<positive integer><h|m|s>`.
    #[error("invalid window `{input}`: {reason}")]
    InvalidWindow {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// Retry policy parameters are out of range.
    #[error("invalid retry policy: {0}")]
    InvalidRetry(String),
    /// A task timeout of zero would fail every attempt.
    #[error("task timeout must be greater than 0")]
    ZeroTimeout,
    /// A maximum queue depth of zero would reject every submission.
    #[error("max_queue_depth must be greater than 0")]
    ZeroQueueDepth,
    /// No limiter was defined in a multi-limiter configuration.
    #[error("at least one limiter must be defined")]
    EmptyConfig,
    /// A named limiter failed validation.
    #[error("limiter `{name}` invalid: {source}")]
    Limiter {
        /// Limiter name.
        name: String,
        /// Underlying validation failure.
        #[source]
        source: Box<ConfigError>,
    },
    /// A required environment variable is missing.
    #[error("missing environment variable `{0}`")]
    MissingEnv(String),
    /// An environment variable could not be parsed.
    #[error("invalid value `{value}` for environment variable `{key}`")]
    InvalidEnv {
        /// Variable name.
        key: String,
        /// Raw value found.
        value: String,
    },
    /// JSON configuration failed to parse.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// No tokio runtime was reachable to spawn tasks onto.
    #[error("no tokio runtime available, build the scheduler inside one or pass a handle")]
    NoRuntime,
}

/// Errors returned synchronously by the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Pending queue reached its configured depth.
    #[error("queue full: {max_depth} tasks pending")]
    QueueFull {
        /// Configured maximum depth.
        max_depth: usize,
    },
    /// Scheduler no longer accepts tasks.
    #[error("scheduler is shut down")]
    Shutdown,
    /// Configuration failure while building a scheduler.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Terminal failure of a submitted task, observed through its handle.
///
/// `E` is the error type of the submitted operation.
#[derive(Debug, Error)]
pub enum TaskError<E> {
    /// Every permitted attempt failed; carries the last error.
    #[error("operation failed after {attempts} attempt(s): {error}")]
    Operation {
        /// Number of attempts made.
        attempts: u32,
        /// Error returned by the final attempt.
        error: E,
    },
    /// The final attempt exceeded the per-attempt timeout.
    #[error("operation timed out after {timeout:?} on attempt {attempts}")]
    TimedOut {
        /// Number of attempts made.
        attempts: u32,
        /// Configured per-attempt timeout.
        timeout: Duration,
    },
    /// Task was removed from the queue before admission.
    #[error("task cancelled before admission")]
    Cancelled,
    /// Scheduler shut down while the task was still queued.
    #[error("scheduler shut down before task was admitted")]
    Shutdown,
    /// Task was dropped without reporting, e.g. its operation panicked.
    #[error("task aborted before reporting an outcome")]
    Aborted,
}

impl<E> TaskError<E> {
    /// Number of attempts made before the task terminated.
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Operation { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
            Self::Cancelled | Self::Shutdown | Self::Aborted => 0,
        }
    }

    /// The operation's own error, if the task failed on one.
    pub const fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
