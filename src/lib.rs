//! # rpc_throttle
//!
//! A sliding-window rate limiter that schedules asynchronous RPC calls.
//!
//! Public RPC endpoints cap how many requests a client may make per time
//! window. This crate sits in front of such an endpoint: callers submit
//! calls freely, and the scheduler releases them in submission order so that
//! no more than `quota` calls complete inside any window.
//!
//! ## Key Features
//!
//! - **Sliding-Window Quota**: At most `quota` completions per rolling window, and at most `quota` calls in flight
//! - **FIFO Admission**: Calls start in the order they were submitted
//! - **Bounded Retries**: Failed calls are retried under a [`core::RetryPolicy`] and then reported
//! - **Opaque Calls**: Any `Fn(context, args) -> Future<Output = Result<T, E>>` can be throttled
//! - **Cancellation and Shutdown**: Queued calls can be withdrawn individually or all at once
//! - **Independent Instances**: One scheduler per endpoint, built from JSON or environment configuration
//!
//! ## Example
//!
//! ```rust
//! use rpc_throttle::core::RateLimitedScheduler;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> rpc_throttle::core::AppResult<()> {
//! // Two calls per second against this endpoint.
//! let scheduler = RateLimitedScheduler::new(2, "1s")?;
//!
//! let handle = scheduler.submit(
//!     String::from("https://api.devnet.example"),
//!     |endpoint: String, slot: u64| async move {
//!         Ok::<_, anyhow::Error>(format!("{endpoint}/block/{slot}"))
//!     },
//!     42,
//! )?;
//!
//! assert_eq!(handle.await?, "https://api.devnet.example/block/42");
//! # Ok(())
//! # }
//! ```
//!
//! For more, see:
//! - `tests/rate_limit_algorithm_test.rs` - Admission, window and timer behaviour
//! - `tests/retry_test.rs` - Retry, timeout and failure propagation

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions and quota accounting.
pub mod core;
/// Configuration models for limiters and windows.
pub mod config;
/// Builders to construct schedulers from code or configuration.
pub mod builders;
/// Runtime adapters used to spawn scheduled work.
pub mod runtime;
/// Shared utilities.
pub mod util;
