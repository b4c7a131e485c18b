//! Pool utilization snapshots.

use serde::{Deserialize, Serialize};

/// Snapshot of pool utilization, taken under the pool lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPoolStats {
    /// Configured minimum number of workers.
    pub min_threads: usize,

    /// Current growth target for normal-priority work.
    pub max_threads: usize,

    /// Live worker threads.
    pub active_threads: usize,

    /// Workers not currently running a routine.
    pub idle_threads: usize,

    /// Highest `active_threads` observed since creation.
    pub peak_threads: usize,

    /// Jobs waiting in the ready queue.
    pub ready_jobs: usize,

    /// Jobs waiting for their due time.
    pub deferred_jobs: usize,

    /// Recyclable job storage held in the cache.
    pub cached_jobs: usize,

    /// Routines that ran to completion.
    pub completed_jobs: u64,

    /// Jobs moved to canceled, explicitly or at shutdown.
    pub canceled_jobs: u64,

    /// Workers spawned above `max_threads` for high-priority admissions.
    pub overflow_spawns: u64,
}

/// Lifetime counters kept alongside the pool state.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub completed_jobs: u64,
    pub canceled_jobs: u64,
    pub overflow_spawns: u64,
    pub peak_threads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = TaskPoolStats::default();
        assert_eq!(stats.active_threads, 0);
        assert_eq!(stats.completed_jobs, 0);
        assert_eq!(stats.overflow_spawns, 0);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = TaskPoolStats {
            min_threads: 1,
            max_threads: 4,
            active_threads: 2,
            ..TaskPoolStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["max_threads"], 4);
        assert_eq!(json["active_threads"], 2);
    }
}
