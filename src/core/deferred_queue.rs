//! Deferred queue: jobs waiting for an absolute due time.

use std::collections::BTreeMap;
use std::time::Instant;

use super::job::Job;

/// Position of a job in the deferred queue. Equal due times keep insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct DeferredKey {
    due: Instant,
    seq: u64,
}

impl DeferredKey {
    pub(crate) const fn due(&self) -> Instant {
        self.due
    }
}

#[derive(Default)]
pub(crate) struct DeferredQueue {
    entries: BTreeMap<DeferredKey, Job>,
    next_seq: u64,
}

impl DeferredQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, job: Job, due: Instant) -> DeferredKey {
        let key = DeferredKey {
            due,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, job);
        key
    }

    pub(crate) fn remove(&mut self, key: &DeferredKey) -> Option<Job> {
        self.entries.remove(key)
    }

    /// Nearest pending due time.
    pub(crate) fn next_due(&self) -> Option<Instant> {
        self.entries.first_key_value().map(|(key, _)| key.due)
    }

    /// Remove every job due at or before `now`, earliest first.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Vec<Job> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().due > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn drain(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.entries).into_values().collect()
    }
}
