//! Core scheduling: jobs, queues, workers and the task pool itself.

pub mod error;
pub mod job;
pub mod stats;
pub mod task_pool;

mod deferred_queue;
mod job_cache;
mod ready_queue;
mod timer;
mod worker;

pub use error::{AppResult, TaskPoolError, TaskPoolResult};
pub use job::{Job, JobKind, JobPriority, JobRoutine, JobStatus};
pub use stats::TaskPoolStats;
pub use task_pool::TaskPool;
