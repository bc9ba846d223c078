//! Bounded worker pool (component G, spec §4.G).
//!
//! A pool owns a set of worker threads, each structurally identical to a
//! §4.F actor minus the mailbox/registry machinery: on startup it
//! evaluates the pool's `init_script`, then loops taking scripts off the
//! pool's shared work queue and depositing results into a completion map
//! keyed by job id. Unlike an actor, a pool worker has no identity visible
//! to `thread::send` — only the pool as a whole is addressable.
//!
//! Grounded on the condvar-per-entry result-storage pattern and
//! `crossbeam_channel`-free, `thread::Builder`-spawned worker loop of the
//! teacher's `core::worker_pool::native` module, generalized from its
//! single-shape request/response job to this component's richer job
//! record (detached vs. tracked, job-id accounting, idle-timeout
//! retirement, min/max workers).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use crate::error::ThreadError;
use crate::script::{EvalOutcome, Interpreter};
use crate::util::IdCounter;

/// Unique identity of a pool, surfaced to scripts as `tpool<u>` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u64);

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tpool{}", self.0)
    }
}

/// Configuration a pool is created with (spec §6 `tpool create` options).
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Workers kept alive even while idle (never retired below this).
    pub min_workers: usize,
    /// Upper bound on concurrently live workers.
    pub max_workers: usize,
    /// How long an idle worker above `min_workers` waits before retiring.
    /// `None` means wait forever (never retire on idleness).
    pub idle_timeout: Option<Duration>,
    /// A script every worker evaluates once, immediately after its
    /// interpreter is created and before it serves its first job.
    pub init_script: Option<String>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_workers: 0,
            max_workers: 4,
            idle_timeout: None,
            init_script: None,
        }
    }
}

impl PoolOptions {
    /// Validate that the option bundle describes a constructible pool.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidConfig`] if `max_workers` is zero or
    /// smaller than `min_workers`.
    pub fn validate(&self) -> Result<(), ThreadError> {
        if self.max_workers == 0 {
            return Err(ThreadError::InvalidConfig("max_workers must be > 0".into()));
        }
        if self.min_workers > self.max_workers {
            return Err(ThreadError::InvalidConfig(
                "min_workers must not exceed max_workers".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum JobState {
    Pending,
    Done(EvalOutcome),
}

struct QueuedJob {
    job_id: Option<u64>,
    script: String,
}

struct PoolState {
    teardown: bool,
    workers: usize,
    idle_workers: usize,
    queue: VecDeque<QueuedJob>,
    completion: HashMap<u64, JobState>,
}

/// One thread pool (spec §3 "Thread pool", §4.G).
pub struct Pool {
    id: PoolId,
    options: PoolOptions,
    state: Mutex<PoolState>,
    work_available: Condvar,
    workers_idle: Condvar,
    job_ids: AtomicU64,
    refcount: std::sync::atomic::AtomicI64,
    make_interp: Arc<dyn Fn() -> Box<dyn Interpreter> + Send + Sync>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Pool {
    fn spawn_worker(self: &Arc<Self>) {
        let pool = Arc::clone(self);
        let builder = thread::Builder::new().name(format!("{}-worker", pool.id));
        let handle = builder
            .spawn(move || worker_main(pool))
            .expect("failed to spawn pool worker thread");
        self.handles.lock().push(handle);
    }

    /// `tpool post ?-detached? pool script`.
    ///
    /// Spawns a fresh worker if none is idle and capacity allows; otherwise
    /// the job waits on the shared queue for the next worker to free up.
    /// Returns the job id unless `detached` is set, matching spec §6's
    /// "returns the job id (or nothing if detached)".
    #[must_use]
    pub fn post(self: &Arc<Self>, script: String, detached: bool) -> Option<u64> {
        let job_id = (!detached).then(|| self.job_ids.fetch_add(1, Ordering::Relaxed));
        let mut state = self.state.lock();
        if let Some(id) = job_id {
            state.completion.insert(id, JobState::Pending);
        }
        state.queue.push_back(QueuedJob { job_id, script });
        if state.idle_workers == 0 && state.workers < self.options.max_workers {
            state.workers += 1;
            drop(state);
            self.spawn_worker();
        } else {
            drop(state);
        }
        self.work_available.notify_one();
        job_id
    }

    /// `tpool wait pool jobIdList ?pendingVarName?`: partition `job_ids`
    /// into those completed and those still pending, blocking until at
    /// least one has completed. Unknown job ids are dropped from both
    /// lists, matching spec §4.G.
    #[must_use]
    pub fn wait(&self, job_ids: &[u64]) -> (Vec<u64>, Vec<u64>) {
        let mut state = self.state.lock();
        loop {
            let mut done = Vec::new();
            let mut pending = Vec::new();
            for &id in job_ids {
                match state.completion.get(&id) {
                    Some(JobState::Done(_)) => done.push(id),
                    Some(JobState::Pending) => pending.push(id),
                    None => {}
                }
            }
            if !done.is_empty() || pending.is_empty() {
                return (done, pending);
            }
            self.workers_idle.wait(&mut state);
        }
    }

    /// `tpool get pool jobId ?resVarName?`: pop and return a completed
    /// job's outcome.
    ///
    /// # Errors
    ///
    /// - [`ThreadError::NoSuchJob`] if `job_id` has no completion entry
    ///   (never posted, detached, or already collected).
    /// - [`ThreadError::NotCompleted`] if it is still pending.
    pub fn collect(&self, job_id: u64) -> Result<EvalOutcome, ThreadError> {
        let mut state = self.state.lock();
        match state.completion.get(&job_id) {
            None => Err(ThreadError::NoSuchJob(job_id)),
            Some(JobState::Pending) => Err(ThreadError::NotCompleted(job_id)),
            Some(JobState::Done(_)) => {
                let Some(JobState::Done(outcome)) = state.completion.remove(&job_id) else {
                    unreachable!("checked above")
                };
                Ok(outcome)
            }
        }
    }

    /// Current reservation count.
    #[must_use]
    pub fn refcount(&self) -> i64 {
        self.refcount.load(Ordering::SeqCst)
    }

    /// `tpool preserve`.
    pub fn preserve(&self) -> i64 {
        self.refcount.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// `tpool release`: on release-to-zero, tear the pool down — signal
    /// every worker, block (the calling thread) until all have exited,
    /// drain the completion map, and discard any jobs still queued.
    pub fn release(self: &Arc<Self>) -> i64 {
        let remaining = self.refcount.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining <= 0 {
            self.teardown();
        }
        remaining
    }

    fn teardown(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            state.teardown = true;
            state.queue.clear();
        }
        self.work_available.notify_all();
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.join();
        }
        self.state.lock().completion.clear();
        // Wake anyone parked in `wait()` on a job that was queued but never
        // picked up: teardown just dropped it from `completion`, so their
        // loop re-checks, finds it gone, and returns it as unknown rather
        // than blocking forever on a pool that no longer has workers.
        self.workers_idle.notify_all();
        info!(pool = %self.id, "pool torn down");
    }

    /// `true` while this pool can still accept work (not torn down).
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.state.lock().teardown
    }
}

fn worker_main(pool: Arc<Pool>) {
    let mut interp = (pool.make_interp)();
    if let Some(script) = &pool.options.init_script {
        let _ = interp.eval(script);
    }
    {
        let mut state = pool.state.lock();
        state.idle_workers += 1;
    }
    loop {
        let job = {
            let mut state = pool.state.lock();
            loop {
                if state.teardown {
                    state.workers -= 1;
                    state.idle_workers -= 1;
                    return;
                }
                if let Some(job) = state.queue.pop_front() {
                    state.idle_workers -= 1;
                    break job;
                }
                let above_min = state.workers > pool.options.min_workers;
                let timed_out = match pool.options.idle_timeout {
                    Some(d) if above_min => pool.work_available.wait_for(&mut state, d).timed_out(),
                    _ => {
                        pool.work_available.wait(&mut state);
                        false
                    }
                };
                if timed_out && state.queue.is_empty() && !state.teardown {
                    state.workers -= 1;
                    state.idle_workers -= 1;
                    debug!(pool = %pool.id, "worker retired after idle timeout");
                    return;
                }
            }
        };

        let outcome = interp.eval(&job.script);

        let mut state = pool.state.lock();
        if let Some(id) = job.job_id {
            state.completion.insert(id, JobState::Done(outcome));
        }
        state.idle_workers += 1;
        drop(state);
        pool.workers_idle.notify_all();
    }
}

/// The process-wide pool registry (spec §3 "links into the global pool
/// list").
#[derive(Default)]
pub struct PoolRegistry {
    pools: Mutex<HashMap<PoolId, Arc<Pool>>>,
    counter: IdCounter,
}

impl PoolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `tpool create`: build a pool, eagerly spawning `min_workers`
    /// workers (spec §3's "`workers >= min_workers` unless tear-down").
    ///
    /// # Errors
    ///
    /// Propagates [`PoolOptions::validate`]'s error.
    pub fn create(
        &self,
        options: PoolOptions,
        make_interp: impl Fn() -> Box<dyn Interpreter> + Send + Sync + 'static,
    ) -> Result<PoolId, ThreadError> {
        options.validate()?;
        let id = PoolId(self.counter.next());
        let min_workers = options.min_workers;
        let pool = Arc::new(Pool {
            id,
            options,
            state: Mutex::new(PoolState {
                teardown: false,
                workers: 0,
                idle_workers: 0,
                queue: VecDeque::new(),
                completion: HashMap::new(),
            }),
            work_available: Condvar::new(),
            workers_idle: Condvar::new(),
            job_ids: AtomicU64::new(0),
            refcount: std::sync::atomic::AtomicI64::new(1),
            make_interp: Arc::new(make_interp),
            handles: Mutex::new(Vec::new()),
        });
        for _ in 0..min_workers {
            pool.state.lock().workers += 1;
            pool.spawn_worker();
        }
        self.pools.lock().insert(id, Arc::clone(&pool));
        info!(pool = %id, min_workers = min_workers, max_workers = pool.options.max_workers, "pool created");
        Ok(id)
    }

    /// Resolve `id` to a live pool.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidPool`] if `id` is unknown.
    pub fn resolve(&self, id: PoolId) -> Result<Arc<Pool>, ThreadError> {
        self.pools
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| ThreadError::InvalidPool(id.to_string()))
    }

    /// `tpool release`: release one reservation; if it drops to zero, tear
    /// the pool down and remove it from the registry so it no longer
    /// resolves (spec §8 scenario 4).
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidPool`] if `id` is unknown.
    pub fn release(&self, id: PoolId) -> Result<i64, ThreadError> {
        let pool = self.resolve(id)?;
        let remaining = pool.release();
        if remaining <= 0 {
            self.pools.lock().remove(&id);
        }
        Ok(remaining)
    }

    /// `tpool preserve`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidPool`] if `id` is unknown.
    pub fn preserve(&self, id: PoolId) -> Result<i64, ThreadError> {
        Ok(self.resolve(id)?.preserve())
    }
}
