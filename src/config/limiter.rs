//! Limiter and multi-limiter configuration structures.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Window;
use crate::core::{ConfigError, RetryPolicy, SchedulerLimits};

/// Configuration of one rate-limited scheduler.
///
/// ```json
/// {
///   "quota": 10,
///   "window": "1s",
///   "retry": { "max_attempts": 3, "backoff": { "kind": "fixed", "delay_ms": 200 } },
///   "task_timeout_ms": 30000,
///   "max_queue_depth": 1000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Maximum completions per window.
    pub quota: u32,
    /// Sliding window length, e.g. `"10s"`.
    pub window: Window,
    /// Retry policy for failed attempts.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Per-attempt timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_timeout_ms: Option<u64>,
    /// Maximum pending tasks before submissions are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_queue_depth: Option<usize>,
}

impl LimiterConfig {
    /// Minimal configuration with defaults for everything but quota and window.
    pub fn new(quota: u32, window: Window) -> Self {
        Self {
            quota,
            window,
            retry: RetryPolicy::default(),
            task_timeout_ms: None,
            max_queue_depth: None,
        }
    }

    /// Scheduler limits described by this configuration.
    pub fn to_limits(&self) -> SchedulerLimits {
        SchedulerLimits {
            quota: self.quota,
            window: self.window,
            retry: self.retry,
            task_timeout: self.task_timeout_ms.map(Duration::from_millis),
            max_queue_depth: self.max_queue_depth,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_limits().validate()
    }

    /// Parse a limiter configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(input)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read `<PREFIX>_QUOTA` and `<PREFIX>_WINDOW` (required) plus
    /// `<PREFIX>_MAX_ATTEMPTS`, `<PREFIX>_TASK_TIMEOUT_MS` and
    /// `<PREFIX>_MAX_QUEUE_DEPTH` (optional) from the environment, loading a
    /// `.env` file first if one exists.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    /// Same keys as [`from_env`](Self::from_env), resolved through `lookup`
    /// instead of the process environment.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let quota_key = format!("{prefix}_QUOTA");
        let window_key = format!("{prefix}_WINDOW");
        let quota = parse_value::<u32>(&quota_key, lookup(&quota_key))?
            .ok_or(ConfigError::MissingEnv(quota_key))?;
        let window = lookup(&window_key).ok_or(ConfigError::MissingEnv(window_key))?;

        let mut cfg = Self::new(quota, Window::parse(&window)?);
        let key = format!("{prefix}_MAX_ATTEMPTS");
        if let Some(max_attempts) = parse_value(&key, lookup(&key))? {
            cfg.retry.max_attempts = max_attempts;
        }
        let key = format!("{prefix}_TASK_TIMEOUT_MS");
        cfg.task_timeout_ms = parse_value(&key, lookup(&key))?;
        let key = format!("{prefix}_MAX_QUEUE_DEPTH");
        cfg.max_queue_depth = parse_value(&key, lookup(&key))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_value<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv {
            key: key.to_owned(),
            value,
        })
}

/// Named limiters, typically one per RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Map of limiter name to configuration.
    pub limiters: HashMap<String, LimiterConfig>,
}

impl SchedulerConfig {
    /// Validate all limiters and ensure at least one exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limiters.is_empty() {
            return Err(ConfigError::EmptyConfig);
        }
        for (name, limiter) in &self.limiters {
            limiter.validate().map_err(|e| ConfigError::Limiter {
                name: name.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(input)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
