//! Jobs: the schedulable unit of work.
//!
//! A [`Job`] binds a [`JobRoutine`] to scheduling state. Jobs come in two
//! kinds:
//!
//! - **Static** jobs are created with [`Job::new`]. The caller owns them and
//!   they can be submitted to any pool.
//! - **Recyclable** jobs are created by
//!   [`TaskPool::create_recyclable_job`](crate::core::TaskPool::create_recyclable_job).
//!   Their storage belongs to the creating pool and is handed back with
//!   `recycle_job` or `destroy_recyclable_job`.
//!
//! `Job` is a cheap handle. Clones refer to the same job; once the job is
//! recycled or destroyed every outstanding clone becomes stale and the pool
//! reports it as [`JobStatus::Undefined`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deferred_queue::DeferredKey;
use super::ready_queue::ReadyKey;
use super::task_pool::TaskPool;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Publicly observable status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The handle no longer refers to a job the pool tracks.
    Undefined,
    /// Created or reset, not submitted.
    Ready,
    /// In the ready queue, or currently executing.
    Scheduled,
    /// Waiting in the deferred queue for its due time.
    Deferred,
    /// The routine ran to completion.
    Completed,
    /// Canceled before it was dispatched.
    Canceled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::Ready => "ready",
            Self::Scheduled => "scheduled",
            Self::Deferred => "deferred",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// Storage ownership of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Caller-owned; never cached or freed by a pool.
    Static,
    /// Pool-owned; returned to the pool's job cache when recycled.
    Recyclable,
}

/// Admission priority passed to [`TaskPool::schedule`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    /// Dispatched in submission order.
    #[default]
    Normal,
    /// Dispatched ahead of normal jobs; may grow the pool beyond `max_threads`.
    High,
}

/// Work executed by a job on a worker thread.
///
/// Any `Fn(&TaskPool, &Job) + Send + Sync + 'static` closure is a routine; the
/// closure's captures play the role of the job context.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use prometheus_task_pool::core::{Job, JobPriority, TaskPool};
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&hits);
/// let job = Job::new(move |_pool: &TaskPool, _job: &Job| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
/// pool.schedule(&job, JobPriority::Normal)?;
/// ```
pub trait JobRoutine: Send + Sync + 'static {
    /// Run the job. Called without the pool lock held.
    fn run(&self, pool: &TaskPool, job: &Job);
}

impl<F> JobRoutine for F
where
    F: Fn(&TaskPool, &Job) + Send + Sync + 'static,
{
    fn run(&self, pool: &TaskPool, job: &Job) {
        self(pool, job);
    }
}

/// Where a job currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobPhase {
    Ready,
    Scheduled(ReadyKey),
    Deferred(DeferredKey),
    Executing(ThreadId),
    Completed,
    Canceled,
    /// Recycled or destroyed; only reachable through stale handles.
    Released,
}

impl JobPhase {
    pub(crate) const fn status(self) -> JobStatus {
        match self {
            Self::Ready => JobStatus::Ready,
            Self::Scheduled(_) | Self::Executing(_) => JobStatus::Scheduled,
            Self::Deferred(_) => JobStatus::Deferred,
            Self::Completed => JobStatus::Completed,
            Self::Canceled => JobStatus::Canceled,
            Self::Released => JobStatus::Undefined,
        }
    }

    pub(crate) const fn is_pending(self) -> bool {
        matches!(self, Self::Scheduled(_) | Self::Deferred(_))
    }
}

/// Mutable job state. Only touched while the owning pool's lock is held.
pub(crate) struct JobState {
    pub(crate) generation: u64,
    pub(crate) phase: JobPhase,
    pub(crate) routine: Option<Arc<dyn JobRoutine>>,
    /// Pool currently tracking the job (set on submission).
    pub(crate) owner: Option<Uuid>,
}

pub(crate) struct JobSlot {
    id: u64,
    kind: JobKind,
    /// Creating pool of a recyclable job.
    home: Option<Uuid>,
    state: Mutex<JobState>,
}

impl JobSlot {
    pub(crate) fn recyclable(home: Uuid) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
            kind: JobKind::Recyclable,
            home: Some(home),
            state: Mutex::new(JobState {
                generation: 0,
                phase: JobPhase::Released,
                routine: None,
                owner: None,
            }),
        })
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, JobState> {
        self.state.lock()
    }

    /// Wipe user data and invalidate every handle to the current generation.
    pub(crate) fn release(&self) -> Option<Arc<dyn JobRoutine>> {
        let mut state = self.state.lock();
        state.generation += 1;
        state.phase = JobPhase::Released;
        state.owner = None;
        state.routine.take()
    }
}

/// Handle to a schedulable job.
#[derive(Clone)]
pub struct Job {
    slot: Arc<JobSlot>,
    generation: u64,
}

impl Job {
    /// Create a static job running `routine`.
    ///
    /// The job starts out [`JobStatus::Ready`] and can be submitted to any
    /// pool. Dropping the last handle frees it.
    pub fn new<R: JobRoutine>(routine: R) -> Self {
        let slot = Arc::new(JobSlot {
            id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
            kind: JobKind::Static,
            home: None,
            state: Mutex::new(JobState {
                generation: 0,
                phase: JobPhase::Ready,
                routine: Some(Arc::new(routine)),
                owner: None,
            }),
        });
        Self {
            slot,
            generation: 0,
        }
    }

    /// Bind a fresh routine to cached or newly allocated recyclable storage.
    pub(crate) fn attach(slot: Arc<JobSlot>, routine: Arc<dyn JobRoutine>) -> Self {
        let generation = {
            let mut state = slot.state();
            state.phase = JobPhase::Ready;
            state.routine = Some(routine);
            state.owner = None;
            state.generation
        };
        Self { slot, generation }
    }

    /// Identifier used in logs. Recycled storage keeps its identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.slot.id
    }

    /// Whether the job is static or recyclable.
    #[must_use]
    pub fn kind(&self) -> JobKind {
        self.slot.kind
    }

    pub(crate) fn home(&self) -> Option<Uuid> {
        self.slot.home
    }

    pub(crate) fn into_slot(self) -> Arc<JobSlot> {
        self.slot
    }

    /// Lock the job state. Callers must already hold the pool lock.
    pub(crate) fn state(&self) -> MutexGuard<'_, JobState> {
        self.slot.state()
    }

    /// Whether this handle still refers to the job's current generation.
    pub(crate) const fn is_current(&self, state: &JobState) -> bool {
        state.generation == self.generation
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.slot.id)
            .field("kind", &self.slot.kind)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
