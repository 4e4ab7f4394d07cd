//! Tests for builder modules

use std::time::Duration;

use rpc_throttle::builders::{build_schedulers, SchedulerBuilder};
use rpc_throttle::config::{LimiterConfig, SchedulerConfig, Window};
use rpc_throttle::core::{Backoff, ConfigError, RateLimitedScheduler, RetryPolicy, SchedulerError};
use rpc_throttle::runtime::TokioSpawner;

#[tokio::test]
async fn test_builder_applies_settings() {
    let scheduler = SchedulerBuilder::new(5, "2m")
        .retry(RetryPolicy::new(4, Backoff::Fixed { delay_ms: 250 }))
        .task_timeout(Duration::from_secs(30))
        .max_queue_depth(100)
        .build()
        .unwrap();

    let limits = scheduler.limits();
    assert_eq!(limits.quota, 5);
    assert_eq!(limits.window.as_duration(), Duration::from_secs(120));
    assert_eq!(limits.retry.max_attempts, 4);
    assert_eq!(limits.task_timeout, Some(Duration::from_secs(30)));
    assert_eq!(limits.max_queue_depth, Some(100));
}

#[test]
fn test_builder_rejects_invalid_window() {
    let err = SchedulerBuilder::new(5, "5 minutes").build().err().unwrap();
    assert!(matches!(err, ConfigError::InvalidWindow { .. }));
}

#[test]
fn test_new_rejects_bad_input() {
    assert!(matches!(
        RateLimitedScheduler::new(0, "1s").err(),
        Some(ConfigError::ZeroQuota)
    ));
    assert!(matches!(
        RateLimitedScheduler::new(1, "1d").err(),
        Some(ConfigError::InvalidWindow { .. })
    ));
}

#[tokio::test]
async fn test_from_config() {
    let mut cfg = LimiterConfig::new(3, Window::parse("1h").unwrap());
    cfg.max_queue_depth = Some(9);
    let spawner = TokioSpawner::current().unwrap();
    let scheduler = RateLimitedScheduler::from_config(&cfg, spawner).unwrap();
    assert_eq!(scheduler.limits(), &cfg.to_limits());
}

#[tokio::test(start_paused = true)]
async fn test_build_schedulers_are_independent() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{"limiters": {
            "devnet": {"quota": 1, "window": "1h"},
            "testnet": {"quota": 1, "window": "1h"}
        }}"#,
    )
    .unwrap();
    let schedulers = build_schedulers(&cfg, TokioSpawner::current().unwrap()).unwrap();
    assert_eq!(schedulers.len(), 2);

    let call = |endpoint: &'static str, _: ()| async move { Ok::<_, anyhow::Error>(endpoint) };
    let devnet = schedulers["devnet"].submit("devnet", call, ()).unwrap();
    let testnet = schedulers["testnet"].submit("testnet", call, ()).unwrap();

    // Each endpoint has its own quota, so neither waits on the other.
    assert_eq!(schedulers["devnet"].stats().in_flight, 1);
    assert_eq!(schedulers["testnet"].stats().in_flight, 1);
    assert_eq!(devnet.await.unwrap(), "devnet");
    assert_eq!(testnet.await.unwrap(), "testnet");
}

#[tokio::test]
async fn test_build_schedulers_rejects_invalid_config() {
    let cfg = SchedulerConfig {
        limiters: std::collections::HashMap::new(),
    };
    let err = build_schedulers(&cfg, TokioSpawner::current().unwrap()).err().unwrap();
    assert!(matches!(err, SchedulerError::Config(ConfigError::EmptyConfig)));
}

#[test]
fn test_construction_outside_runtime_needs_a_handle() {
    assert!(matches!(
        RateLimitedScheduler::new(1, "1s").err(),
        Some(ConfigError::NoRuntime)
    ));
    assert!(matches!(
        SchedulerBuilder::new(1, "1s").build().err(),
        Some(ConfigError::NoRuntime)
    ));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let scheduler = SchedulerBuilder::new(1, "1s")
        .spawner(TokioSpawner::new(runtime.handle().clone()))
        .build()
        .unwrap();
    let add = |base: u64, step: u64| async move { Ok::<_, anyhow::Error>(base + step) };
    let handle = scheduler.submit(20u64, add, 1).unwrap();
    assert_eq!(runtime.block_on(handle).unwrap(), 21);
}
