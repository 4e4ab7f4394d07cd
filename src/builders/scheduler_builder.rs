//! Fluent scheduler construction and multi-limiter builds from configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::{LimiterConfig, SchedulerConfig, Window};
use crate::core::{
    ConfigError, RateLimitedScheduler, RetryPolicy, SchedulerError, SchedulerLimits, Spawn,
};
use crate::runtime::TokioSpawner;

/// Fluent builder for a [`RateLimitedScheduler`].
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new(5, "1s")
///     .retry(RetryPolicy::new(4, Backoff::Fixed { delay_ms: 250 }))
///     .task_timeout(Duration::from_secs(30))
///     .max_queue_depth(10_000)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct SchedulerBuilder<S = TokioSpawner> {
    quota: u32,
    window: String,
    retry: RetryPolicy,
    task_timeout: Option<Duration>,
    max_queue_depth: Option<usize>,
    spawner: Option<S>,
}

impl SchedulerBuilder<TokioSpawner> {
    /// Start a builder for `quota` completions per `window` (e.g. `"10s"`).
    ///
    /// Captures the current tokio runtime; outside one, `build` fails with
    /// [`ConfigError::NoRuntime`] unless a spawner is set.
    pub fn new(quota: u32, window: impl Into<String>) -> Self {
        Self {
            quota,
            window: window.into(),
            retry: RetryPolicy::default(),
            task_timeout: None,
            max_queue_depth: None,
            spawner: TokioSpawner::current().ok(),
        }
    }
}

impl<S> SchedulerBuilder<S>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Retry policy applied to every task.
    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    /// Maximum pending tasks before `submit` rejects.
    #[must_use]
    pub const fn max_queue_depth(mut self, depth: usize) -> Self {
        self.max_queue_depth = Some(depth);
        self
    }

    /// Spawn onto a different runtime adapter.
    pub fn spawner<T>(self, spawner: T) -> SchedulerBuilder<T>
    where
        T: Spawn + Send + Sync + 'static,
    {
        SchedulerBuilder {
            quota: self.quota,
            window: self.window,
            retry: self.retry,
            task_timeout: self.task_timeout,
            max_queue_depth: self.max_queue_depth,
            spawner: Some(spawner),
        }
    }

    /// Validate settings and build the scheduler.
    pub fn build(self) -> Result<RateLimitedScheduler<S>, ConfigError> {
        let limits = SchedulerLimits {
            quota: self.quota,
            window: Window::parse(&self.window)?,
            retry: self.retry,
            task_timeout: self.task_timeout,
            max_queue_depth: self.max_queue_depth,
        };
        limits.validate()?;
        let spawner = self.spawner.ok_or(ConfigError::NoRuntime)?;
        RateLimitedScheduler::with_spawner(limits, spawner)
    }
}

impl<S> RateLimitedScheduler<S>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Scheduler described by a limiter configuration.
    pub fn from_config(cfg: &LimiterConfig, spawner: S) -> Result<Self, ConfigError> {
        Self::with_spawner(cfg.to_limits(), spawner)
    }
}

/// Build one independent scheduler per named limiter.
pub fn build_schedulers<S>(
    cfg: &SchedulerConfig,
    spawner: S,
) -> Result<HashMap<String, RateLimitedScheduler<S>>, SchedulerError>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    cfg.validate()?;

    let mut schedulers = HashMap::new();
    for (name, limiter) in &cfg.limiters {
        let scheduler = RateLimitedScheduler::from_config(limiter, spawner.clone())?;
        tracing::debug!(
            limiter = %name,
            quota = limiter.quota,
            window = %limiter.window,
            "built scheduler"
        );
        schedulers.insert(name.clone(), scheduler);
    }

    Ok(schedulers)
}
