//! Configuration models for task pools.

pub mod pool;

pub use pool::{SchedulerConfig, TaskPoolConfig, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_RECYCLE_LIMIT};
