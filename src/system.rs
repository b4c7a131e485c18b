//! Process-wide system task pool.
//!
//! Independent components that want to share one pool can use the system
//! pool instead of threading a [`TaskPool`] handle through their
//! constructors. It has an explicit lifecycle: create it once during
//! bootstrap, before any component calls [`system_pool`], and destroy it
//! during teardown.
//!
//! # Examples
//!
//! ```rust,ignore
//! use prometheus_task_pool::config::TaskPoolConfig;
//! use prometheus_task_pool::system;
//!
//! system::create_system_pool(TaskPoolConfig::new().with_thread_name("system"))?;
//!
//! let pool = system::system_pool().expect("created during bootstrap");
//! // ... hand `pool` clones to components ...
//!
//! system::destroy_system_pool();
//! ```

use parking_lot::RwLock;
use tracing::info;

use crate::config::TaskPoolConfig;
use crate::core::{TaskPool, TaskPoolError, TaskPoolResult};

static SYSTEM_POOL: RwLock<Option<TaskPool>> = RwLock::new(None);

/// Create the system pool.
///
/// # Errors
///
/// - `TaskPoolError::IllegalOperation` if a system pool already exists
/// - any error from [`TaskPool::create`]; no system pool is installed
pub fn create_system_pool(config: TaskPoolConfig) -> TaskPoolResult<TaskPool> {
    let mut slot = SYSTEM_POOL.write();
    if slot.is_some() {
        return Err(TaskPoolError::illegal("system task pool already created"));
    }
    let pool = TaskPool::create(config)?;
    info!(pool_id = %pool.id(), "system task pool created");
    *slot = Some(pool.clone());
    Ok(pool)
}

/// Handle to the system pool, if it has been created.
#[must_use]
pub fn system_pool() -> Option<TaskPool> {
    SYSTEM_POOL.read().clone()
}

/// Destroy the system pool, if any, and allow a new one to be created.
///
/// Blocks like [`TaskPool::destroy`]. Returns `false` when there was nothing
/// to destroy.
pub fn destroy_system_pool() -> bool {
    let pool = SYSTEM_POOL.write().take();
    match pool {
        Some(pool) => {
            info!(pool_id = %pool.id(), "destroying system task pool");
            pool.destroy();
            true
        }
        None => false,
    }
}
