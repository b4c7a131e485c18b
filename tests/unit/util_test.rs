//! Tests for utility functions

use std::time::{Duration, Instant};

use prometheus_task_pool::util::clock;
use prometheus_task_pool::util::init_tracing;

#[test]
fn test_due_after_orders_by_delay() {
    let short = clock::due_after(10);
    let long = clock::due_after(1_000);
    assert!(short < long);
    assert!(clock::millis_until(long) > clock::millis_until(short));
}

#[test]
fn test_millis_until_past_is_zero() {
    let past = Instant::now()
        .checked_sub(Duration::from_millis(10))
        .unwrap_or_else(Instant::now);
    assert_eq!(clock::millis_until(past), 0);
}

#[test]
fn test_init_tracing() {
    init_tracing();
    tracing::info!(component = "util_test", "tracing initialized");
}
