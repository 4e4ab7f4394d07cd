//! Configuration models for limiters and their windows.

pub mod limiter;
pub mod window;

pub use limiter::{LimiterConfig, SchedulerConfig};
pub use window::Window;
