//! Bounded free-list of recyclable job storage.

use std::sync::Arc;

use uuid::Uuid;

use super::job::JobSlot;

pub(crate) struct JobCache {
    free: Vec<Arc<JobSlot>>,
    capacity: usize,
}

impl JobCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Take cached storage, or allocate fresh storage owned by `home`.
    pub(crate) fn fetch_or_allocate(&mut self, home: Uuid) -> Arc<JobSlot> {
        self.free
            .pop()
            .unwrap_or_else(|| JobSlot::recyclable(home))
    }

    /// Cache released storage if there is room. Returns `false` when the
    /// storage was dropped instead.
    pub(crate) fn recycle(&mut self, slot: Arc<JobSlot>) -> bool {
        if self.free.len() < self.capacity {
            self.free.push(slot);
            true
        } else {
            false
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.free.clear();
    }
}
