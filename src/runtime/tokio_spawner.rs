//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;

use crate::core::{ConfigError, Spawn};

/// Tokio-based spawner for scheduler tasks and timers.
///
/// Always bound to a runtime handle, so spawning works from any thread,
/// including plain `std::thread`s outside the runtime.
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Create a spawner bound to a tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Create a spawner bound to the runtime of the calling context.
    pub fn current() -> Result<Self, ConfigError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|_| ConfigError::NoRuntime)
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
