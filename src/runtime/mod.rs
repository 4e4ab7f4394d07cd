//! Runtime adapters for spawning scheduler work.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
