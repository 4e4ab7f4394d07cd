//! Tests for configuration parsing and validation

use std::collections::HashMap;
use std::time::Duration;

use rpc_throttle::config::{LimiterConfig, SchedulerConfig, Window};
use rpc_throttle::core::{Backoff, ConfigError};

#[test]
fn test_window_values() {
    assert_eq!(Window::parse("10s").unwrap().as_duration(), Duration::from_millis(10_000));
    assert_eq!(Window::parse("5m").unwrap().as_duration(), Duration::from_millis(300_000));
    assert_eq!(Window::parse("2h").unwrap().as_duration(), Duration::from_millis(7_200_000));
    assert!("10".parse::<Window>().is_err());
    assert!("10 s".parse::<Window>().is_err());
}

#[test]
fn test_limiter_config_validation() {
    let valid = LimiterConfig::new(10, Window::parse("1s").unwrap());
    assert!(valid.validate().is_ok());

    let mut invalid = valid.clone();
    invalid.quota = 0;
    assert!(matches!(invalid.validate(), Err(ConfigError::ZeroQuota)));

    let mut invalid = valid.clone();
    invalid.task_timeout_ms = Some(0);
    assert!(matches!(invalid.validate(), Err(ConfigError::ZeroTimeout)));

    let mut invalid = valid;
    invalid.retry.max_attempts = 0;
    assert!(matches!(invalid.validate(), Err(ConfigError::InvalidRetry(_))));
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "limiters": {
            "devnet": {
                "quota": 10,
                "window": "1s",
                "retry": {"max_attempts": 5, "backoff": {"kind": "exponential", "initial_ms": 100, "factor": 2, "max_ms": 2000}}
            },
            "mainnet": {
                "quota": 40,
                "window": "10s",
                "max_queue_depth": 500
            }
        }
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.limiters.len(), 2);

    let devnet = &config.limiters["devnet"];
    assert_eq!(devnet.retry.max_attempts, 5);
    assert_eq!(
        devnet.retry.backoff,
        Backoff::Exponential { initial_ms: 100, factor: 2, max_ms: 2000 }
    );

    let mainnet = &config.limiters["mainnet"];
    assert_eq!(mainnet.window.to_string(), "10s");
    assert_eq!(mainnet.max_queue_depth, Some(500));
}

#[test]
fn test_scheduler_config_empty_limiters() {
    let err = SchedulerConfig::from_json_str(r#"{"limiters": {}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyConfig));
}

#[test]
fn test_scheduler_config_names_invalid_limiter() {
    let json = r#"{"limiters": {"devnet": {"quota": 0, "window": "1s"}}}"#;
    let err = SchedulerConfig::from_json_str(json).unwrap_err();
    match err {
        ConfigError::Limiter { name, source } => {
            assert_eq!(name, "devnet");
            assert!(matches!(*source, ConfigError::ZeroQuota));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scheduler_config_round_trips_window_strings() {
    let config = SchedulerConfig::from_json_str(
        r#"{"limiters": {"a": {"quota": 1, "window": "120s"}}}"#,
    )
    .unwrap();
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["limiters"]["a"]["window"], "2m");
}

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_limiter_config_from_lookup() {
    let lookup = lookup_from(&[
        ("DEVNET_QUOTA", "4"),
        ("DEVNET_WINDOW", "30s"),
        ("DEVNET_MAX_ATTEMPTS", "6"),
        ("DEVNET_TASK_TIMEOUT_MS", "2500"),
    ]);

    let cfg = LimiterConfig::from_lookup("DEVNET", lookup).unwrap();
    assert_eq!(cfg.quota, 4);
    assert_eq!(cfg.window.as_duration(), Duration::from_secs(30));
    assert_eq!(cfg.retry.max_attempts, 6);
    assert_eq!(cfg.task_timeout_ms, Some(2500));
    assert_eq!(cfg.max_queue_depth, None);
}

#[test]
fn test_limiter_config_from_lookup_missing_quota() {
    let lookup = lookup_from(&[("DEVNET_WINDOW", "30s")]);
    let err = LimiterConfig::from_lookup("DEVNET", lookup).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnv(key) if key == "DEVNET_QUOTA"));
}

#[test]
fn test_limiter_config_from_lookup_bad_values() {
    let lookup = lookup_from(&[("DEVNET_QUOTA", "4"), ("DEVNET_WINDOW", "30 seconds")]);
    let err = LimiterConfig::from_lookup("DEVNET", lookup).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidWindow { .. }));

    let lookup = lookup_from(&[
        ("DEVNET_QUOTA", "4"),
        ("DEVNET_WINDOW", "30s"),
        ("DEVNET_MAX_QUEUE_DEPTH", "lots"),
    ]);
    let err = LimiterConfig::from_lookup("DEVNET", lookup).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { key, .. } if key == "DEVNET_MAX_QUEUE_DEPTH"));
}

#[test]
fn test_limiter_config_from_env_requires_quota() {
    // Never set by any test, so the process environment is only read.
    let err = LimiterConfig::from_env("RPC_THROTTLE_UNSET_LIMITER").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingEnv(key) if key == "RPC_THROTTLE_UNSET_LIMITER_QUOTA"
    ));
}
