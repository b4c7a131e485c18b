//! Tests for builder modules

use std::collections::HashMap;

use prometheus_task_pool::builders::{build_pools, PoolBuilder};
use prometheus_task_pool::config::{SchedulerConfig, TaskPoolConfig};
use prometheus_task_pool::core::TaskPoolError;

#[test]
fn test_pool_builder_defaults() {
    let builder = PoolBuilder::new("pool1");
    assert_eq!(builder.name(), "pool1");
    assert_eq!(builder.config().thread_name, "pool1");
    assert_eq!(builder.config().min_threads, 1);
}

#[test]
fn test_pool_builder_builds_pool() {
    let pool = PoolBuilder::new("built")
        .with_config(TaskPoolConfig::new().with_min_threads(2).with_max_threads(2))
        .build()
        .unwrap();
    assert_eq!(pool.stats().active_threads, 2);
    assert_eq!(pool.config().max_threads, 2);
    pool.destroy();
}

#[test]
fn test_pool_builder_error_names_pool() {
    let result = PoolBuilder::new("broken")
        .with_config(TaskPoolConfig::new().with_min_threads(0))
        .build();
    match result {
        Err(TaskPoolError::BadParameter(msg)) => assert!(msg.contains("broken")),
        other => panic!("expected bad parameter, got {other:?}"),
    }
}

#[test]
fn test_build_pools_from_config() {
    let mut pools = HashMap::new();
    pools.insert("io".to_string(), TaskPoolConfig::new().with_max_threads(2));
    pools.insert(
        "metrics".to_string(),
        TaskPoolConfig::new().with_max_threads(1),
    );

    let built = build_pools(&SchedulerConfig { pools }).unwrap();
    assert_eq!(built.len(), 2);
    assert_ne!(built["io"].id(), built["metrics"].id());
    for (_, pool) in built {
        pool.destroy();
    }
}

#[test]
fn test_build_pools_rejects_empty_config() {
    let result = build_pools(&SchedulerConfig::default());
    assert!(matches!(result, Err(TaskPoolError::BadParameter(_))));
}
