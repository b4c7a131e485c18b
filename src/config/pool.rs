//! Task pool and scheduler configuration structures.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Default Job Cache capacity.
pub const DEFAULT_RECYCLE_LIMIT: usize = 8;

/// Default idle time before a worker above `min_threads` exits.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 60_000;

/// Configuration for a single task pool.
///
/// # Example
///
/// ```rust,ignore
/// use prometheus_task_pool::config::TaskPoolConfig;
///
/// let config = TaskPoolConfig::new()
///     .with_min_threads(2)
///     .with_max_threads(8)
///     .with_thread_name("io-pool");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPoolConfig {
    /// Workers spawned at creation; the pool never shrinks below this.
    pub min_threads: usize,
    /// Growth target for normal-priority work.
    pub max_threads: usize,
    /// Worker stack size in bytes; platform default when unset.
    pub stack_size: Option<usize>,
    /// Prefix for worker and timer thread names.
    pub thread_name: String,
    /// Idle time in milliseconds before a surplus worker exits.
    pub idle_timeout_ms: u64,
    /// Capacity of the recyclable job cache.
    pub recycle_limit: usize,
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        Self {
            min_threads: 1,
            max_threads: num_cpus::get().max(1),
            stack_size: None,
            thread_name: "taskpool".into(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            recycle_limit: DEFAULT_RECYCLE_LIMIT,
        }
    }
}

impl TaskPoolConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum number of workers.
    #[must_use]
    pub const fn with_min_threads(mut self, min_threads: usize) -> Self {
        self.min_threads = min_threads;
        self
    }

    /// Set the maximum number of workers for normal-priority growth.
    #[must_use]
    pub const fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the worker stack size in bytes.
    #[must_use]
    pub const fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the job cache capacity.
    #[must_use]
    pub const fn with_recycle_limit(mut self, limit: usize) -> Self {
        self.recycle_limit = limit;
        self
    }

    /// Idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_threads == 0 {
            return Err("min_threads must be greater than 0".into());
        }
        if self.min_threads > self.max_threads {
            return Err(format!(
                "min_threads ({}) must not exceed max_threads ({})",
                self.min_threads, self.max_threads
            ));
        }
        if self.idle_timeout_ms == 0 {
            return Err("idle_timeout_ms must be greater than 0".into());
        }
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".into());
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a configuration from `TASKPOOL_*` environment variables, loading
    /// a `.env` file first if one exists. Unset variables keep their defaults.
    ///
    /// Recognized variables: `TASKPOOL_MIN_THREADS`, `TASKPOOL_MAX_THREADS`,
    /// `TASKPOOL_STACK_SIZE`, `TASKPOOL_THREAD_NAME`, `TASKPOOL_IDLE_TIMEOUT_MS`,
    /// `TASKPOOL_RECYCLE_LIMIT`.
    ///
    /// # Errors
    ///
    /// Fails if a variable does not parse or the result does not validate.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        if let Some(v) = env_var::<usize>("TASKPOOL_MIN_THREADS")? {
            cfg.min_threads = v;
        }
        if let Some(v) = env_var::<usize>("TASKPOOL_MAX_THREADS")? {
            cfg.max_threads = v;
        }
        if let Some(v) = env_var::<usize>("TASKPOOL_STACK_SIZE")? {
            cfg.stack_size = Some(v);
        }
        if let Some(v) = env_var::<String>("TASKPOOL_THREAD_NAME")? {
            cfg.thread_name = v;
        }
        if let Some(v) = env_var::<u64>("TASKPOOL_IDLE_TIMEOUT_MS")? {
            cfg.idle_timeout_ms = v;
        }
        if let Some(v) = env_var::<usize>("TASKPOOL_RECYCLE_LIMIT")? {
            cfg.recycle_limit = v;
        }

        cfg.validate()
            .map_err(anyhow::Error::msg)
            .context("invalid task pool configuration from environment")?;
        Ok(cfg)
    }
}

fn env_var<T>(name: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("failed to parse {name}={raw:?}")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {name}")),
    }
}

/// Root configuration describing a named set of pools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Map of pool name to configuration.
    pub pools: HashMap<String, TaskPoolConfig>,
}

impl SchedulerConfig {
    /// Validate all pools and ensure at least one pool exists.
    ///
    /// # Errors
    ///
    /// Returns a description naming the first invalid pool.
    pub fn validate(&self) -> Result<(), String> {
        if self.pools.is_empty() {
            return Err("at least one pool must be defined".into());
        }
        for (name, pool) in &self.pools {
            pool.validate()
                .map_err(|e| format!("pool `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
