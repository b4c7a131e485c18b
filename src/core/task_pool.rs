//! The task pool: admission, cancellation, job lifecycle and pool lifecycle.
//!
//! All mutable pool state (queues, thread counts, job cache) lives behind a
//! single `parking_lot::Mutex`. Job routines run on worker threads with that
//! lock released, so a long or blocking routine never stalls admission.
//!
//! # Thread accounting
//!
//! `idle_threads` counts workers that are not running a routine. Whenever the
//! ready queue holds more jobs than there are idle workers, admission spawns a
//! worker as long as `active_threads < max_threads`. High-priority admissions
//! may additionally spawn one overflow worker past `max_threads`; overflow
//! workers exit as soon as they find the ready queue empty while the pool is
//! above its target.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TaskPoolConfig;
use crate::util::clock;

use super::deferred_queue::DeferredQueue;
use super::error::{TaskPoolError, TaskPoolResult};
use super::job::{Job, JobKind, JobPhase, JobPriority, JobRoutine, JobState, JobStatus};
use super::job_cache::JobCache;
use super::ready_queue::ReadyQueue;
use super::stats::{PoolCounters, TaskPoolStats};
use super::{timer, worker};

/// State guarded by the pool lock.
pub(crate) struct PoolState {
    pub(crate) min_threads: usize,
    pub(crate) max_threads: usize,
    pub(crate) active_threads: usize,
    pub(crate) idle_threads: usize,
    pub(crate) shutdown: bool,
    pub(crate) timer_running: bool,
    pub(crate) ready: ReadyQueue,
    pub(crate) deferred: DeferredQueue,
    pub(crate) cache: JobCache,
    pub(crate) counters: PoolCounters,
    workers: HashMap<usize, JoinHandle<()>>,
    next_worker_id: usize,
    timer: Option<JoinHandle<()>>,
}

impl PoolState {
    /// Remove a pending job from whichever queue holds it.
    fn unlink(&mut self, phase: JobPhase) {
        match phase {
            JobPhase::Scheduled(key) => {
                self.ready.remove(&key);
            }
            JobPhase::Deferred(key) => {
                self.deferred.remove(&key);
            }
            _ => {}
        }
    }
}

pub(crate) struct PoolShared {
    pub(crate) id: Uuid,
    pub(crate) config: TaskPoolConfig,
    pub(crate) state: Mutex<PoolState>,
    /// Signals workers: new ready work, shutdown, or a lowered thread target.
    pub(crate) work_available: Condvar,
    /// Signals the timer thread that the deferred queue head changed.
    pub(crate) timer_signal: Condvar,
    /// Signals `destroy` that a worker or the timer exited.
    pub(crate) exited: Condvar,
}

/// Handle to a task pool.
///
/// Handles are cheap to clone and all refer to the same pool. Job routines
/// receive a handle so they can resubmit, recycle or schedule other jobs.
///
/// Call [`TaskPool::destroy`] to shut the pool down; dropping handles does not
/// stop the worker threads.
#[derive(Clone)]
pub struct TaskPool {
    pub(crate) shared: Arc<PoolShared>,
}

impl TaskPool {
    /// Create a pool and eagerly spawn `min_threads` workers plus the deferred
    /// timer thread.
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::BadParameter` if the configuration does not validate
    /// - `TaskPoolError::NoMemory` if a thread cannot be spawned; every thread
    ///   spawned so far is stopped and joined before returning
    pub fn create(config: TaskPoolConfig) -> TaskPoolResult<Self> {
        config.validate().map_err(TaskPoolError::BadParameter)?;

        let shared = Arc::new(PoolShared {
            id: Uuid::new_v4(),
            state: Mutex::new(PoolState {
                min_threads: config.min_threads,
                max_threads: config.max_threads,
                active_threads: 0,
                idle_threads: 0,
                shutdown: false,
                timer_running: false,
                ready: ReadyQueue::new(),
                deferred: DeferredQueue::new(),
                cache: JobCache::new(config.recycle_limit),
                counters: PoolCounters::default(),
                workers: HashMap::new(),
                next_worker_id: 0,
                timer: None,
            }),
            config,
            work_available: Condvar::new(),
            timer_signal: Condvar::new(),
            exited: Condvar::new(),
        });
        let pool = Self { shared };

        let started = {
            let mut state = pool.shared.state.lock();
            pool.start_threads(&mut state)
        };

        if let Err(e) = started {
            warn!(pool_id = %pool.shared.id, error = %e, "task pool creation failed, rolling back");
            pool.shutdown_and_join();
            return Err(TaskPoolError::NoMemory(e.to_string()));
        }

        info!(
            pool_id = %pool.shared.id,
            min_threads = pool.shared.config.min_threads,
            max_threads = pool.shared.config.max_threads,
            recycle_limit = pool.shared.config.recycle_limit,
            "task pool initialized"
        );
        Ok(pool)
    }

    fn start_threads(&self, state: &mut PoolState) -> std::io::Result<()> {
        let pool = self.clone();
        let handle = thread::Builder::new()
            .name(format!("{}-timer", self.shared.config.thread_name))
            .spawn(move || timer::run(&pool))?;
        state.timer = Some(handle);
        state.timer_running = true;

        for _ in 0..state.min_threads {
            self.spawn_worker(state)?;
        }
        Ok(())
    }

    /// Unique identity of this pool.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Configuration the pool was created with.
    #[must_use]
    pub fn config(&self) -> &TaskPoolConfig {
        &self.shared.config
    }

    /// Snapshot current utilization.
    #[must_use]
    pub fn stats(&self) -> TaskPoolStats {
        let state = self.shared.state.lock();
        TaskPoolStats {
            min_threads: state.min_threads,
            max_threads: state.max_threads,
            active_threads: state.active_threads,
            idle_threads: state.idle_threads,
            peak_threads: state.counters.peak_threads,
            ready_jobs: state.ready.len(),
            deferred_jobs: state.deferred.len(),
            cached_jobs: state.cache.len(),
            completed_jobs: state.counters.completed_jobs,
            canceled_jobs: state.counters.canceled_jobs,
            overflow_spawns: state.counters.overflow_spawns,
        }
    }

    /// Change the growth target.
    ///
    /// Lowering the target below the number of live workers wakes idle
    /// workers so the surplus exits; busy workers exit after their current
    /// routine. Raising it spawns nothing until demand requires it.
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::BadParameter` if `max_threads` is zero or below `min_threads`
    /// - `TaskPoolError::ShutdownInProgress` if the pool is being destroyed
    pub fn set_max_threads(&self, max_threads: usize) -> TaskPoolResult<()> {
        let mut state = self.shared.state.lock();
        if max_threads == 0 || max_threads < state.min_threads {
            return Err(TaskPoolError::bad_parameter(format!(
                "max_threads ({max_threads}) must be at least min_threads ({})",
                state.min_threads
            )));
        }
        if state.shutdown {
            return Err(TaskPoolError::ShutdownInProgress);
        }

        let previous = state.max_threads;
        state.max_threads = max_threads;
        if max_threads < state.active_threads {
            self.shared.work_available.notify_all();
        }
        info!(
            previous,
            max_threads,
            active_threads = state.active_threads,
            "task pool max threads updated"
        );
        Ok(())
    }

    /// Create a recyclable job, reusing cached storage when available.
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::ShutdownInProgress` if the pool is being destroyed
    pub fn create_recyclable_job<R: JobRoutine>(&self, routine: R) -> TaskPoolResult<Job> {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(TaskPoolError::ShutdownInProgress);
        }
        let slot = state.cache.fetch_or_allocate(self.shared.id);
        drop(state);

        let job = Job::attach(slot, Arc::new(routine));
        debug!(job_id = job.id(), "recyclable job created");
        Ok(job)
    }

    /// Submit `job` for immediate dispatch.
    ///
    /// A job that is already scheduled or deferred is moved to the back of its
    /// lane (or the front of the ready queue for `JobPriority::High`) without
    /// creating a second dispatch.
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::BadParameter` for a stale handle or a job owned by another pool
    /// - `TaskPoolError::IllegalOperation` if the job is executing on another
    ///   thread or is completed/canceled and has not been reset
    /// - `TaskPoolError::NoMemory` if a high-priority job needs a new worker
    ///   and the thread cannot be spawned; the job is left untouched
    /// - `TaskPoolError::ShutdownInProgress` if the pool is being destroyed
    pub fn schedule(&self, job: &Job, priority: JobPriority) -> TaskPoolResult<()> {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(TaskPoolError::ShutdownInProgress);
        }
        let mut js = job.state();
        self.check_submittable(job, &js)?;

        let already_ready = matches!(js.phase, JobPhase::Scheduled(_));
        let pending = state.ready.len() + usize::from(!already_ready);
        self.grow_for(&mut state, pending, priority)?;

        let previous = js.phase;
        state.unlink(previous);
        if matches!(previous, JobPhase::Deferred(_)) {
            self.shared.timer_signal.notify_one();
        }
        let key = state.ready.push(job.clone(), priority);
        js.phase = JobPhase::Scheduled(key);
        js.owner = Some(self.shared.id);
        drop(js);

        self.shared.work_available.notify_one();
        debug!(job_id = job.id(), ?priority, resubmitted = previous.is_pending(), "job scheduled");
        Ok(())
    }

    /// Submit `job` to run `delay_ms` milliseconds from now.
    ///
    /// Calling this again before the job is dispatched replaces its due time.
    /// A zero delay behaves like [`TaskPool::schedule`] with normal priority.
    ///
    /// # Errors
    ///
    /// Same as [`TaskPool::schedule`].
    pub fn schedule_deferred(&self, job: &Job, delay_ms: u64) -> TaskPoolResult<()> {
        if delay_ms == 0 {
            return self.schedule(job, JobPriority::Normal);
        }

        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(TaskPoolError::ShutdownInProgress);
        }
        let mut js = job.state();
        self.check_submittable(job, &js)?;

        let previous = js.phase;
        if let JobPhase::Deferred(old) = previous {
            debug!(
                job_id = job.id(),
                replaced_due_ms = clock::millis_until(old.due()),
                "deferred job rescheduled"
            );
        }
        state.unlink(previous);
        let key = state.deferred.push(job.clone(), clock::due_after(delay_ms));
        js.phase = JobPhase::Deferred(key);
        js.owner = Some(self.shared.id);
        drop(js);

        self.shared.timer_signal.notify_one();
        debug!(
            job_id = job.id(),
            delay_ms,
            resubmitted = previous.is_pending(),
            "job deferred"
        );
        Ok(())
    }

    /// Current status of `job`.
    ///
    /// The answer may be outdated as soon as it is returned. Stale handles
    /// report [`JobStatus::Undefined`].
    #[must_use]
    pub fn get_status(&self, job: &Job) -> JobStatus {
        let _state = self.shared.state.lock();
        let js = job.state();
        if job.is_current(&js) {
            js.phase.status()
        } else {
            JobStatus::Undefined
        }
    }

    /// Cancel `job` if it has not been dispatched yet.
    ///
    /// Returns the status the job had when it was canceled. Canceling an
    /// already canceled job succeeds again.
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::CancelFailed` if the job is executing, completed, or
    ///   the handle is stale; `status` reports what was found
    /// - `TaskPoolError::BadParameter` for a job owned by another pool
    /// - `TaskPoolError::ShutdownInProgress` if the pool is being destroyed
    pub fn try_cancel(&self, job: &Job) -> TaskPoolResult<JobStatus> {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(TaskPoolError::ShutdownInProgress);
        }
        let mut js = job.state();
        if !job.is_current(&js) {
            return Err(TaskPoolError::CancelFailed {
                status: JobStatus::Undefined,
            });
        }
        self.check_owner(job, &js)?;
        self.cancel_locked(&mut state, job, &mut js)
    }

    /// Return a completed or canceled job to `Ready` so it can be submitted again.
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::BadParameter` for a stale handle or a job owned by another pool
    /// - `TaskPoolError::IllegalOperation` if the job is pending or executing
    /// - `TaskPoolError::ShutdownInProgress` if the pool is being destroyed
    pub fn reset_job(&self, job: &Job) -> TaskPoolResult<()> {
        let state = self.shared.state.lock();
        if state.shutdown {
            return Err(TaskPoolError::ShutdownInProgress);
        }
        let mut js = job.state();
        if !job.is_current(&js) {
            return Err(TaskPoolError::bad_parameter("stale job handle"));
        }
        self.check_owner(job, &js)?;
        match js.phase {
            JobPhase::Ready => Ok(()),
            JobPhase::Completed | JobPhase::Canceled => {
                js.phase = JobPhase::Ready;
                js.owner = None;
                debug!(job_id = job.id(), "job reset");
                Ok(())
            }
            phase => Err(TaskPoolError::illegal(format!(
                "cannot reset a {} job",
                phase.status()
            ))),
        }
    }

    /// Return a recyclable job's storage to the pool's cache, or free it if
    /// the cache is full. A pending job is canceled first.
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::IllegalOperation` for static jobs, or if the job is
    ///   executing on another thread
    /// - `TaskPoolError::BadParameter` for a stale handle or a job of another pool
    /// - `TaskPoolError::ShutdownInProgress` if the pool is being destroyed
    pub fn recycle_job(&self, job: Job) -> TaskPoolResult<()> {
        self.reclaim(job, true)
    }

    /// Free a recyclable job's storage without caching it. A pending job is
    /// canceled first.
    ///
    /// # Errors
    ///
    /// Same as [`TaskPool::recycle_job`].
    pub fn destroy_recyclable_job(&self, job: Job) -> TaskPoolResult<()> {
        self.reclaim(job, false)
    }

    fn reclaim(&self, job: Job, cache: bool) -> TaskPoolResult<()> {
        if job.kind() == JobKind::Static {
            warn!(job_id = job.id(), "attempt to recycle or destroy a static job");
            return Err(TaskPoolError::illegal("static jobs cannot be recycled or destroyed"));
        }

        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(TaskPoolError::ShutdownInProgress);
        }
        {
            let mut js = job.state();
            if !job.is_current(&js) {
                return Err(TaskPoolError::bad_parameter("stale job handle"));
            }
            self.check_owner(&job, &js)?;
            let phase = js.phase;
            match phase {
                JobPhase::Executing(thread_id) if thread_id != thread::current().id() => {
                    return Err(TaskPoolError::illegal("job is executing"));
                }
                phase if phase.is_pending() => {
                    self.cancel_locked(&mut state, &job, &mut js)?;
                }
                _ => {}
            }
        }

        let job_id = job.id();
        let slot = job.into_slot();
        let routine = slot.release();
        let cached = cache && state.cache.recycle(slot);
        drop(state);
        drop(routine);

        debug!(job_id, cached, "recyclable job reclaimed");
        Ok(())
    }

    /// Shut the pool down and wait for it to drain.
    ///
    /// Every ready or deferred job is canceled, workers finish the routine
    /// they are running and exit, and the timer thread stops. This blocks
    /// without a timeout until all of that has happened. Other handles to the
    /// pool report `ShutdownInProgress` afterwards.
    pub fn destroy(self) {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                debug!(pool_id = %self.shared.id, "task pool already shutting down");
                return;
            }
            state.shutdown = true;

            let pending: Vec<Job> = state
                .ready
                .drain()
                .into_iter()
                .chain(state.deferred.drain())
                .collect();
            for job in &pending {
                let mut js = job.state();
                js.phase = JobPhase::Canceled;
                state.counters.canceled_jobs += 1;
            }
            info!(
                pool_id = %self.shared.id,
                canceled = pending.len(),
                active_threads = state.active_threads,
                "task pool shutting down"
            );
        }
        self.shutdown_and_join();
        info!(pool_id = %self.shared.id, "task pool destroyed");
    }

    /// Wake every thread, wait for them to exit, join them and drop cached jobs.
    fn shutdown_and_join(&self) {
        let me = thread::current().id();
        let handles: Vec<JoinHandle<()>> = {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.work_available.notify_all();
            self.shared.timer_signal.notify_all();

            // A routine may destroy its own pool; its worker cannot wait for itself.
            let own_worker = usize::from(
                state
                    .workers
                    .values()
                    .any(|handle| handle.thread().id() == me),
            );
            while state.active_threads > own_worker || state.timer_running {
                self.shared.exited.wait(&mut state);
            }

            state.cache.clear();
            let timer = state.timer.take();
            state
                .workers
                .drain()
                .map(|(_, handle)| handle)
                .chain(timer)
                .filter(|handle| handle.thread().id() != me)
                .collect()
        };

        for handle in handles {
            if handle.join().is_err() {
                warn!("task pool thread panicked");
            }
        }
    }

    /// Spawn a worker. The new worker counts as idle until it takes a job.
    pub(crate) fn spawn_worker(&self, state: &mut PoolState) -> std::io::Result<()> {
        state.workers.retain(|_, handle| !handle.is_finished());

        let worker_id = state.next_worker_id;
        state.next_worker_id += 1;

        let pool = self.clone();
        let mut builder =
            thread::Builder::new().name(format!("{}-{worker_id}", self.shared.config.thread_name));
        if let Some(stack_size) = self.shared.config.stack_size {
            builder = builder.stack_size(stack_size);
        }
        let handle = builder.spawn(move || worker::run(&pool, worker_id))?;

        state.workers.insert(worker_id, handle);
        state.active_threads += 1;
        state.idle_threads += 1;
        state.counters.peak_threads = state.counters.peak_threads.max(state.active_threads);
        Ok(())
    }

    /// Grow the pool if `pending` ready jobs outnumber idle workers.
    ///
    /// Normal growth stops at `max_threads` and a failed spawn only costs
    /// responsiveness. A high-priority admission that needs a worker fails
    /// with `NoMemory` when none can be spawned; at the cap it takes the
    /// overflow path.
    pub(crate) fn grow_for(
        &self,
        state: &mut PoolState,
        pending: usize,
        priority: JobPriority,
    ) -> TaskPoolResult<()> {
        self.grow_with(state, pending, priority, Self::spawn_worker)
    }

    fn grow_with<F>(
        &self,
        state: &mut PoolState,
        pending: usize,
        priority: JobPriority,
        mut spawn: F,
    ) -> TaskPoolResult<()>
    where
        F: FnMut(&Self, &mut PoolState) -> std::io::Result<()>,
    {
        if state.idle_threads >= pending {
            return Ok(());
        }
        if state.active_threads < state.max_threads {
            return match spawn(self, state) {
                Ok(()) => {
                    debug!(
                        active_threads = state.active_threads,
                        max_threads = state.max_threads,
                        "task pool grew by one worker"
                    );
                    Ok(())
                }
                Err(e) if priority == JobPriority::High => {
                    warn!(error = %e, "failed to create a worker thread for high-priority job");
                    Err(TaskPoolError::NoMemory(e.to_string()))
                }
                Err(e) => {
                    warn!(error = %e, "task pool failed to create a worker thread");
                    Ok(())
                }
            };
        }
        if priority == JobPriority::High {
            return self.spawn_overflow_worker(state, spawn);
        }
        Ok(())
    }

    /// Spawn a worker past `max_threads` so an urgent job cannot starve behind
    /// routines that occupy every worker.
    fn spawn_overflow_worker<F>(&self, state: &mut PoolState, mut spawn: F) -> TaskPoolResult<()>
    where
        F: FnMut(&Self, &mut PoolState) -> std::io::Result<()>,
    {
        spawn(self, state).map_err(|e| {
            warn!(error = %e, "failed to spawn overflow worker for high-priority job");
            TaskPoolError::NoMemory(e.to_string())
        })?;
        state.counters.overflow_spawns += 1;
        info!(
            active_threads = state.active_threads,
            max_threads = state.max_threads,
            "spawned overflow worker for high-priority job"
        );
        Ok(())
    }

    fn check_owner(&self, job: &Job, js: &JobState) -> TaskPoolResult<()> {
        if job.home().is_some_and(|home| home != self.shared.id) {
            return Err(TaskPoolError::bad_parameter("job belongs to a different task pool"));
        }
        let tracked_elsewhere = js.owner.is_some_and(|owner| owner != self.shared.id)
            && (js.phase.is_pending() || matches!(js.phase, JobPhase::Executing(_)));
        if tracked_elsewhere {
            return Err(TaskPoolError::bad_parameter("job is tracked by a different task pool"));
        }
        Ok(())
    }

    /// Admission legality shared by `schedule` and `schedule_deferred`.
    fn check_submittable(&self, job: &Job, js: &JobState) -> TaskPoolResult<()> {
        if !job.is_current(js) {
            return Err(TaskPoolError::bad_parameter("stale job handle"));
        }
        self.check_owner(job, js)?;
        match js.phase {
            JobPhase::Ready | JobPhase::Scheduled(_) | JobPhase::Deferred(_) => Ok(()),
            // Resubmission from inside the job's own routine.
            JobPhase::Executing(thread_id) if thread_id == thread::current().id() => Ok(()),
            JobPhase::Executing(_) => Err(TaskPoolError::illegal("job is executing")),
            phase => Err(TaskPoolError::illegal(format!(
                "job is {} and has not been reset",
                phase.status()
            ))),
        }
    }

    fn cancel_locked(
        &self,
        state: &mut PoolState,
        job: &Job,
        js: &mut JobState,
    ) -> TaskPoolResult<JobStatus> {
        let previous = js.phase;
        match previous {
            JobPhase::Canceled => Ok(JobStatus::Canceled),
            JobPhase::Ready | JobPhase::Scheduled(_) | JobPhase::Deferred(_) => {
                state.unlink(previous);
                if matches!(previous, JobPhase::Deferred(_)) {
                    self.shared.timer_signal.notify_one();
                }
                js.phase = JobPhase::Canceled;
                state.counters.canceled_jobs += 1;
                debug!(job_id = job.id(), from = %previous.status(), "job canceled");
                Ok(previous.status())
            }
            JobPhase::Executing(_) | JobPhase::Completed | JobPhase::Released => {
                warn!(job_id = job.id(), status = %previous.status(), "attempt to cancel a job that already ran");
                Err(TaskPoolError::CancelFailed {
                    status: previous.status(),
                })
            }
        }
    }
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("id", &self.shared.id)
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}
