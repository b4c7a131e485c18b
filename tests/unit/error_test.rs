//! Tests for error types

use prometheus_task_pool::core::{JobStatus, TaskPoolError};

#[test]
fn test_bad_parameter_error() {
    let err = TaskPoolError::BadParameter("stale job handle".to_string());
    assert_eq!(format!("{}", err), "bad parameter: stale job handle");
}

#[test]
fn test_illegal_operation_error() {
    let err = TaskPoolError::IllegalOperation("job is executing".to_string());
    assert_eq!(format!("{}", err), "illegal operation: job is executing");
}

#[test]
fn test_no_memory_error() {
    let err = TaskPoolError::NoMemory("thread spawn refused".to_string());
    assert_eq!(format!("{}", err), "no memory: thread spawn refused");
}

#[test]
fn test_shutdown_error() {
    let err = TaskPoolError::ShutdownInProgress;
    assert_eq!(format!("{}", err), "shutdown in progress");
}

#[test]
fn test_cancel_failed_error_reports_status() {
    let err = TaskPoolError::CancelFailed {
        status: JobStatus::Completed,
    };
    assert_eq!(format!("{}", err), "cancel failed: job is completed");
}

#[test]
fn test_error_converts_to_anyhow() {
    let err: anyhow::Error = TaskPoolError::ShutdownInProgress.into();
    assert!(err.downcast_ref::<TaskPoolError>().is_some());
}
