//! Ready queue: jobs eligible for immediate dispatch.
//!
//! Entries are ordered by lane (high priority first), then by admission
//! sequence. Each admission returns a [`ReadyKey`] which the job keeps so a
//! cancel or resubmission can unlink it in O(log n).

use std::collections::BTreeMap;

use super::job::{Job, JobPriority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Lane {
    High,
    Normal,
}

/// Position of a job in the ready queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ReadyKey {
    lane: Lane,
    seq: u64,
}

#[derive(Default)]
pub(crate) struct ReadyQueue {
    entries: BTreeMap<ReadyKey, Job>,
    next_seq: u64,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, job: Job, priority: JobPriority) -> ReadyKey {
        let lane = match priority {
            JobPriority::High => Lane::High,
            JobPriority::Normal => Lane::Normal,
        };
        let key = ReadyKey {
            lane,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, job);
        key
    }

    /// Pop the highest-priority, earliest-admitted job.
    pub(crate) fn pop(&mut self) -> Option<Job> {
        self.entries.pop_first().map(|(_, job)| job)
    }

    pub(crate) fn remove(&mut self, key: &ReadyKey) -> Option<Job> {
        self.entries.remove(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn drain(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.entries).into_values().collect()
    }
}
