//! Tests for utility functions

use rpc_throttle::util::{init_tracing, init_tracing_with};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    // A subscriber is now installed, so a second attempt is a no-op.
    assert!(!init_tracing_with("debug"));
    init_tracing();
}
