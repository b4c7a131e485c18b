//! Worker thread loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::MutexGuard;
use tracing::{debug, error};

use super::job::{Job, JobPhase, JobRoutine};
use super::task_pool::TaskPool;

/// Body of a worker thread.
///
/// The worker holds the pool lock except while a routine runs. It exits on
/// shutdown, when the pool is above its thread target, or after an idle
/// timeout while above `min_threads`.
pub(crate) fn run(pool: &TaskPool, worker_id: usize) {
    let shared = &pool.shared;
    let me = thread::current().id();
    debug!(worker_id, "worker thread started");

    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            debug!(worker_id, "worker shutting down");
            break;
        }

        if let Some(job) = state.ready.pop() {
            let routine = {
                let mut js = job.state();
                js.phase = JobPhase::Executing(me);
                js.routine.clone()
            };
            state.idle_threads -= 1;

            if let Some(routine) = routine {
                MutexGuard::unlocked(&mut state, || execute(pool, &job, routine, worker_id));
            }

            state.idle_threads += 1;
            let mut js = job.state();
            // The routine may have rescheduled or recycled its own job.
            if job.is_current(&js) && js.phase == JobPhase::Executing(me) {
                js.phase = JobPhase::Completed;
                state.counters.completed_jobs += 1;
            }
            continue;
        }

        if state.active_threads > state.max_threads {
            debug!(
                worker_id,
                active_threads = state.active_threads,
                max_threads = state.max_threads,
                "worker exiting, pool above max threads"
            );
            break;
        }

        let timed_out = shared
            .work_available
            .wait_for(&mut state, shared.config.idle_timeout())
            .timed_out();
        if timed_out
            && !state.shutdown
            && state.ready.is_empty()
            && state.active_threads > state.min_threads
        {
            debug!(worker_id, active_threads = state.active_threads, "idle worker exiting");
            break;
        }
    }

    state.active_threads -= 1;
    state.idle_threads -= 1;
    shared.exited.notify_all();
}

/// Run `routine`, then drop the worker's reference to it, both inside the
/// unwind boundary. After a routine recycles its own job this is the last
/// reference, so the drop runs the routine's destructors.
fn execute(pool: &TaskPool, job: &Job, routine: Arc<dyn JobRoutine>, worker_id: usize) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
        routine.run(pool, job);
        drop(routine);
    }));
    if outcome.is_err() {
        error!(worker_id, job_id = job.id(), "job routine panicked");
    }
}
