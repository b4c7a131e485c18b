//! Builders to construct task pools from configuration.

use std::collections::HashMap;

use tracing::warn;

use crate::config::{SchedulerConfig, TaskPoolConfig};
use crate::core::{TaskPool, TaskPoolError, TaskPoolResult};

/// Named task pool under construction.
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    name: String,
    config: TaskPoolConfig,
}

impl PoolBuilder {
    /// Start a builder for pool `name`. Worker threads are named after it.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let config = TaskPoolConfig::default().with_thread_name(name.clone());
        Self { name, config }
    }

    /// Replace the configuration wholesale.
    #[must_use]
    pub fn with_config(mut self, config: TaskPoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration that [`PoolBuilder::build`] will use.
    #[must_use]
    pub const fn config(&self) -> &TaskPoolConfig {
        &self.config
    }

    /// Create the pool.
    ///
    /// # Errors
    ///
    /// Propagates [`TaskPool::create`] errors; validation failures name the pool.
    pub fn build(self) -> TaskPoolResult<TaskPool> {
        let name = self.name;
        TaskPool::create(self.config).map_err(|e| match e {
            TaskPoolError::BadParameter(msg) => {
                TaskPoolError::BadParameter(format!("pool `{name}` invalid: {msg}"))
            }
            other => other,
        })
    }
}

/// Create every pool in `cfg`.
///
/// If any pool fails to start, the pools already created are destroyed before
/// the error is returned.
///
/// # Errors
///
/// - `TaskPoolError::BadParameter` if the scheduler configuration does not validate
/// - any error from [`TaskPool::create`]
pub fn build_pools(cfg: &SchedulerConfig) -> TaskPoolResult<HashMap<String, TaskPool>> {
    cfg.validate().map_err(TaskPoolError::BadParameter)?;

    let mut pools = HashMap::new();
    for (name, pool_cfg) in &cfg.pools {
        let built = PoolBuilder::new(name.clone())
            .with_config(pool_cfg.clone())
            .build();
        match built {
            Ok(pool) => {
                pools.insert(name.clone(), pool);
            }
            Err(e) => {
                warn!(pool = %name, error = %e, "pool creation failed, destroying created pools");
                for (_, pool) in pools.drain() {
                    pool.destroy();
                }
                return Err(e);
            }
        }
    }

    Ok(pools)
}
