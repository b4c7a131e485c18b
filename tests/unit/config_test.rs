//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_task_pool::config::{
    SchedulerConfig, TaskPoolConfig, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_RECYCLE_LIMIT,
};

#[test]
fn test_pool_config_validation() {
    let valid = TaskPoolConfig::new()
        .with_min_threads(2)
        .with_max_threads(4)
        .with_stack_size(256 * 1024)
        .with_thread_name("io");
    assert!(valid.validate().is_ok());
    assert_eq!(valid.stack_size, Some(256 * 1024));
}

#[test]
fn test_pool_config_invalid_min_threads() {
    let invalid = TaskPoolConfig::new().with_min_threads(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_min_above_max() {
    let invalid = TaskPoolConfig::new()
        .with_min_threads(3)
        .with_max_threads(2);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_idle_timeout() {
    let invalid = TaskPoolConfig::new().with_idle_timeout(Duration::ZERO);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_empty_thread_name() {
    let invalid = TaskPoolConfig::new().with_thread_name("  ");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_defaults() {
    let cfg = TaskPoolConfig::default();
    assert_eq!(cfg.min_threads, 1);
    assert!(cfg.max_threads >= 1);
    assert_eq!(cfg.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
    assert_eq!(cfg.recycle_limit, DEFAULT_RECYCLE_LIMIT);
    assert_eq!(cfg.recycle_limit, 8);
}

#[test]
fn test_pool_config_from_json() {
    let json = r#"{
        "min_threads": 2,
        "max_threads": 6,
        "thread_name": "metrics",
        "idle_timeout_ms": 5000,
        "recycle_limit": 16
    }"#;

    let cfg = TaskPoolConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.max_threads, 6);
    assert_eq!(cfg.thread_name, "metrics");
    assert_eq!(cfg.idle_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.recycle_limit, 16);
    assert!(cfg.stack_size.is_none());
}

#[test]
fn test_pool_config_from_json_rejects_invalid() {
    assert!(TaskPoolConfig::from_json_str(r#"{ "min_threads": 0 }"#).is_err());
    assert!(TaskPoolConfig::from_json_str("not json").is_err());
}

#[test]
fn test_pool_config_from_env() {
    std::env::set_var("TASKPOOL_MIN_THREADS", "2");
    std::env::set_var("TASKPOOL_MAX_THREADS", "5");
    std::env::set_var("TASKPOOL_THREAD_NAME", "env-pool");
    let cfg = TaskPoolConfig::from_env().unwrap();
    assert_eq!(cfg.min_threads, 2);
    assert_eq!(cfg.max_threads, 5);
    assert_eq!(cfg.thread_name, "env-pool");

    std::env::set_var("TASKPOOL_MAX_THREADS", "many");
    let err = TaskPoolConfig::from_env().unwrap_err();
    assert!(format!("{err:#}").contains("TASKPOOL_MAX_THREADS"));

    std::env::set_var("TASKPOOL_MAX_THREADS", "1");
    assert!(TaskPoolConfig::from_env().is_err());

    std::env::remove_var("TASKPOOL_MIN_THREADS");
    std::env::remove_var("TASKPOOL_MAX_THREADS");
    std::env::remove_var("TASKPOOL_THREAD_NAME");
}

#[test]
fn test_scheduler_config_validation() {
    let mut pools = HashMap::new();
    pools.insert("pool1".to_string(), TaskPoolConfig::new());

    let config = SchedulerConfig { pools };
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_empty_pools() {
    let config = SchedulerConfig {
        pools: HashMap::new(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_scheduler_config_names_invalid_pool() {
    let mut pools = HashMap::new();
    pools.insert("broken".to_string(), TaskPoolConfig::new().with_min_threads(0));

    let err = SchedulerConfig { pools }.validate().unwrap_err();
    assert!(err.contains("broken"));
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "pools": {
            "io": { "min_threads": 1, "max_threads": 4 },
            "metrics": { "min_threads": 1, "max_threads": 1, "recycle_limit": 2 }
        }
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.pools.len(), 2);
    assert_eq!(config.pools["io"].max_threads, 4);
    assert_eq!(config.pools["metrics"].recycle_limit, 2);
}
