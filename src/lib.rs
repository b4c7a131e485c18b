//! # Prometheus Task Pool
//!
//! An embeddable job scheduler over a bounded, dynamically growable pool of
//! worker threads.
//!
//! Callers submit jobs for immediate or time-deferred execution; the pool
//! dispatches them to worker threads, grows on demand up to a configured
//! target, shrinks idle workers back toward its minimum, and lets callers
//! cancel jobs that have not started yet.
//!
//! ## Key Features
//!
//! - **Demand-driven growth**: a worker is spawned whenever ready jobs outnumber idle workers
//! - **Priority escalation**: high-priority jobs jump the queue and may exceed `max_threads`
//! - **Deferred execution**: a timer thread promotes jobs at their due time
//! - **Cooperative cancellation**: pending jobs can be canceled; running ones cannot
//! - **Recyclable jobs**: a bounded cache of job storage avoids allocation churn on hot paths
//! - **Self-resubmission**: a routine may reschedule, defer or recycle its own job
//!
//! ## Guarantees
//!
//! Every submitted job runs at most once per submission, on a worker thread,
//! no earlier than its requested time, unless it is canceled first.
//!
//! ## Example
//!
//! ```rust,ignore
//! use prometheus_task_pool::config::TaskPoolConfig;
//! use prometheus_task_pool::core::{Job, JobPriority, TaskPool};
//!
//! let pool = TaskPool::create(TaskPoolConfig::new().with_min_threads(2).with_max_threads(4))?;
//!
//! let job = Job::new(|_pool: &TaskPool, job: &Job| {
//!     tracing::info!(job_id = job.id(), "tick");
//! });
//! pool.schedule(&job, JobPriority::Normal)?;
//!
//! let periodic = pool.create_recyclable_job(|pool: &TaskPool, job: &Job| {
//!     // Runs again in one second.
//!     let _ = pool.schedule_deferred(job, 1_000);
//! })?;
//! pool.schedule_deferred(&periodic, 1_000)?;
//!
//! pool.destroy();
//! ```
//!
//! For complete scenarios, see `tests/task_pool_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Jobs, queues, workers and the task pool.
pub mod core;
/// Configuration models for task pools.
pub mod config;
/// Builders to construct task pools from configuration.
pub mod builders;
/// Process-wide system pool.
pub mod system;
/// Shared utilities.
pub mod util;

pub use crate::config::TaskPoolConfig;
pub use crate::core::{
    Job, JobKind, JobPriority, JobRoutine, JobStatus, TaskPool, TaskPoolError, TaskPoolResult,
    TaskPoolStats,
};
