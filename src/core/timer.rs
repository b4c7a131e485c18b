//! Deferred job timer.
//!
//! A single thread per pool sleeps until the earliest due time in the
//! deferred queue and moves due jobs to the ready queue. Admission and cancel
//! paths signal `timer_signal` whenever the queue head may have changed, so
//! the thread always waits on the current earliest deadline.

use std::time::Instant;

use tracing::{debug, warn};

use crate::util::clock;

use super::job::{JobPhase, JobPriority};
use super::task_pool::{PoolState, TaskPool};

/// Body of the timer thread.
pub(crate) fn run(pool: &TaskPool) {
    let shared = &pool.shared;
    debug!(pool_id = %shared.id, "deferred timer started");

    let mut state = shared.state.lock();
    while !state.shutdown {
        promote_due(pool, &mut state, clock::now());

        match state.deferred.next_due() {
            Some(due) => {
                debug!(next_due_ms = clock::millis_until(due), "timer armed");
                shared.timer_signal.wait_until(&mut state, due);
            }
            None => shared.timer_signal.wait(&mut state),
        }
    }

    state.timer_running = false;
    shared.exited.notify_all();
    debug!(pool_id = %shared.id, "deferred timer stopped");
}

/// Move every job due at `now` to the back of the normal lane.
pub(crate) fn promote_due(pool: &TaskPool, state: &mut PoolState, now: Instant) {
    for job in state.deferred.pop_due(now) {
        let pending = state.ready.len() + 1;
        if let Err(e) = pool.grow_for(state, pending, JobPriority::Normal) {
            warn!(job_id = job.id(), error = %e, "could not grow pool for deferred job");
        }

        let key = state.ready.push(job.clone(), JobPriority::Normal);
        job.state().phase = JobPhase::Scheduled(key);
        pool.shared.work_available.notify_one();
        debug!(job_id = job.id(), "deferred job promoted");
    }
}
