//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "rpc_throttle=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_FILTER`]. Does nothing if a subscriber is already set.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Like [`init_tracing`] with a caller-chosen fallback directive.
///
/// Returns `true` if this call installed the subscriber.
pub fn init_tracing_with(default_filter: &str) -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
