//! Error types for task pool operations.

use thiserror::Error;

use super::job::JobStatus;

/// Errors produced by task pool operations.
///
/// Every failure is reported synchronously to the caller; the pool never
/// retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskPoolError {
    /// Invalid arguments, stale job handles, or a job owned by another pool.
    #[error("bad parameter: {0}")]
    BadParameter(String),
    /// The operation is not valid for the job's kind or current state.
    #[error("illegal operation: {0}")]
    IllegalOperation(String),
    /// The system refused a resource (typically a worker thread).
    #[error("no memory: {0}")]
    NoMemory(String),
    /// The pool is being destroyed.
    #[error("shutdown in progress")]
    ShutdownInProgress,
    /// The job could not be canceled because it already ran or is running.
    #[error("cancel failed: job is {status}")]
    CancelFailed {
        /// Status of the job at the time of the attempt.
        status: JobStatus,
    },
}

impl TaskPoolError {
    pub(crate) fn bad_parameter(msg: impl Into<String>) -> Self {
        Self::BadParameter(msg.into())
    }

    pub(crate) fn illegal(msg: impl Into<String>) -> Self {
        Self::IllegalOperation(msg.into())
    }
}

/// Result type for task pool operations.
pub type TaskPoolResult<T> = Result<T, TaskPoolError>;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
