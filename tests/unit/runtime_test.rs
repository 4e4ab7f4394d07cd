//! Tests for tokio spawner utilities

use rpc_throttle::core::{ConfigError, RateLimitedScheduler, Spawn};
use rpc_throttle::runtime::tokio_spawner::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_current_outside_runtime_fails() {
    assert!(matches!(TokioSpawner::current(), Err(ConfigError::NoRuntime)));
}

#[test]
fn test_scheduler_submits_from_plain_thread() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let scheduler = runtime
        .block_on(async { RateLimitedScheduler::new(1, "1s") })
        .unwrap();

    let multiply = |value: u64, factor: u64| async move { Ok::<_, anyhow::Error>(value * factor) };
    let worker = scheduler.clone();
    let handle = std::thread::spawn(move || worker.submit(21u64, multiply, 2).unwrap())
        .join()
        .unwrap();

    assert_eq!(runtime.block_on(handle).unwrap(), 42);
    assert_eq!(scheduler.stats().succeeded, 1);
}

#[test]
fn test_spawner_bound_to_foreign_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let spawner = TokioSpawner::new(runtime.handle().clone());

    let (tx, rx) = std::sync::mpsc::channel();
    spawner.spawn(async move {
        tx.send(7).unwrap();
    });
    assert_eq!(rx.recv().unwrap(), 7);
}
