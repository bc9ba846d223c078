//! The `Runtime` facade (spec §6 "External interfaces"): one inherent
//! method per script-visible operation, wiring together the actor
//! registry, the handle registry, the shared variable store, and the
//! thread-pool registry behind a single long-lived owner object.
//!
//! A command-dispatch layer (parsing `mutex lock $h`, `tsv::set a k v`, …)
//! is out of scope; this is the engine such a layer would call into.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::actor::lifecycle::{preserve as actor_preserve, release as actor_release, unwind as actor_unwind};
use crate::actor::{self, ActorContext, ActorId, ActorSpawnOptions, ErrorHandler};
use crate::config::{ActorConfig, PoolConfig};
use crate::error::ThreadError;
use crate::handle::{HandleRegistry, SyncObject};
use crate::pool::{PoolId, PoolOptions, PoolRegistry};
use crate::script::{EvalOutcome, Interpreter};
use crate::sync::{locked_eval, CondVar, ExclusiveMutex, RecursiveMutex, RwMutex};
use crate::vars::{SearchMode, SharedVarStore};

/// A function that builds a fresh [`Interpreter`] for a newly spawned
/// actor or pool worker.
pub type InterpreterFactory = Arc<dyn Fn() -> Box<dyn Interpreter> + Send + Sync>;

/// The single long-lived owner of one process's actor/mailbox runtime.
///
/// Constructed explicitly by the embedder rather than reached through a
/// global singleton (spec §9's Open Question, resolved in `DESIGN.md`): an
/// embedder that needs more than one independent runtime — tests, for
/// instance — simply constructs more than one `Runtime`.
pub struct Runtime {
    ctx: Arc<ActorContext>,
    handles: HandleRegistry,
    vars: SharedVarStore,
    pools: PoolRegistry,
    make_interp: InterpreterFactory,
    join_handles: Mutex<HashMap<ActorId, JoinHandle<()>>>,
    cond_pairing: Mutex<HashMap<String, String>>,
}

impl Runtime {
    /// Build a runtime whose actors and pool workers all run interpreters
    /// produced by `make_interp`.
    pub fn new(make_interp: impl Fn() -> Box<dyn Interpreter> + Send + Sync + 'static) -> Self {
        Self {
            ctx: Arc::new(ActorContext::new()),
            handles: HandleRegistry::new(),
            vars: SharedVarStore::new(),
            pools: PoolRegistry::new(),
            make_interp: Arc::new(make_interp),
            join_handles: Mutex::new(HashMap::new()),
            cond_pairing: Mutex::new(HashMap::new()),
        }
    }

    fn factory(&self) -> impl Fn() -> Box<dyn Interpreter> + Send + Sync + 'static {
        let make_interp = Arc::clone(&self.make_interp);
        move || make_interp()
    }

    // ---- Actors (spec §6 "Actors") -------------------------------------

    /// `create ?-joinable? ?script?` → id.
    pub fn actor_create(&self, bootstrap: Option<String>, opts: ActorSpawnOptions) -> ActorId {
        let joinable = opts.joinable;
        let spawned = actor::spawn(Arc::clone(&self.ctx), bootstrap, self.factory(), opts);
        if joinable {
            if let Some(handle) = spawned.join_handle {
                self.join_handles.lock().insert(spawned.id, handle);
            }
        }
        spawned.id
    }

    /// `create` variant driven by a deserialized [`ActorConfig`].
    ///
    /// # Errors
    ///
    /// Propagates [`ActorConfig::validate`]'s error.
    pub fn actor_create_with_config(&self, bootstrap: Option<String>, cfg: ActorConfig) -> Result<ActorId, String> {
        cfg.validate()?;
        Ok(self.actor_create(bootstrap, cfg.into()))
    }

    /// `send id script` → result (spec §4.E `SendSync`). Runs inline on
    /// `interp` with no mailbox round-trip when `target == caller`.
    ///
    /// # Errors
    ///
    /// See [`actor::send_sync`].
    pub fn send_sync(
        &self,
        caller: ActorId,
        target: ActorId,
        script: String,
        interp: &mut dyn Interpreter,
    ) -> Result<String, ThreadError> {
        actor::send_sync(&self.ctx, caller, target, script, interp)
    }

    /// `send -async id script` (spec §4.E `SendAsync`, no callback).
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidTarget`] if `target` does not resolve.
    pub fn send_async(&self, target: ActorId, script: String) -> Result<(), ThreadError> {
        actor::send_async(&self.ctx, target, script)
    }

    /// `send -async id script varName` (spec §4.E `SendAsyncWithCallback`).
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidTarget`] if `target` does not resolve.
    pub fn send_async_with_callback(
        &self,
        origin: ActorId,
        target: ActorId,
        script: String,
        var_name: String,
    ) -> Result<(), ThreadError> {
        actor::send_async_with_callback(&self.ctx, origin, target, script, var_name)
    }

    /// `exit`/`unwind`: request that `caller`'s own event loop stop after
    /// the job currently running returns.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidTarget`] if `caller` is not a live
    /// actor.
    pub fn actor_unwind(&self, caller: ActorId) -> Result<(), ThreadError> {
        actor_unwind(&self.ctx, caller)
    }

    /// `names` → id-list.
    #[must_use]
    pub fn actor_names(&self) -> Vec<ActorId> {
        self.ctx.registry.names()
    }

    /// `exists id` → 0/1.
    #[must_use]
    pub fn actor_exists(&self, id: ActorId) -> bool {
        self.ctx.registry.exists(id)
    }

    /// `join id` → exit-code. Blocks until the actor's OS thread has
    /// exited; only available for actors spawned with
    /// [`ActorSpawnOptions::joinable`] set, and only once.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidTarget`] if `id` was never joinable,
    /// has already been joined, or the thread panicked.
    pub fn actor_join(&self, id: ActorId) -> Result<(), ThreadError> {
        let handle = self.join_handles.lock().remove(&id).ok_or(ThreadError::InvalidTarget(id.raw()))?;
        handle.join().map_err(|_| ThreadError::InvalidTarget(id.raw()))
    }

    /// `transfer id channel`.
    ///
    /// # Errors
    ///
    /// See [`actor::transfer`].
    pub fn actor_transfer(&self, caller: ActorId, target: ActorId, channel: String) -> Result<(), ThreadError> {
        actor::transfer(&self.ctx, caller, target, channel)
    }

    /// `preserve id` → new-refcount.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidTarget`] if `id` is not a live actor.
    pub fn actor_preserve(&self, id: ActorId) -> Result<i64, ThreadError> {
        actor_preserve(&self.ctx, id)
    }

    /// `release id` → new-refcount.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidTarget`] if `id` is not a live actor.
    pub fn actor_release(&self, caller: ActorId, id: ActorId) -> Result<i64, ThreadError> {
        actor_release(&self.ctx, caller, id)
    }

    /// `errorproc ?procName?`: route unhandled script errors to `target`,
    /// sent as `scriptName offender errorInfo`.
    pub fn set_error_handler(&self, target: ActorId, script_name: String) {
        *self.ctx.error_handler.lock() = Some(ErrorHandler { target, script_name });
    }

    /// `errorproc {}`: revert to logging unhandled errors to `tracing`.
    pub fn clear_error_handler(&self) {
        *self.ctx.error_handler.lock() = None;
    }

    /// `configure id -unwindonerror bool`.
    ///
    /// `-eventmark` is fixed at `create` time (it sizes a backpressure
    /// threshold baked into the actor's mailbox record) and is not
    /// reconfigurable after the fact; see `DESIGN.md`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidTarget`] if `id` is not a live actor.
    pub fn actor_set_unwind_on_error(&self, id: ActorId, value: bool) -> Result<(), ThreadError> {
        self.ctx.registry.resolve(id)?.set_unwind_on_error(value);
        Ok(())
    }

    // ---- Thread pools (spec §6 "Pools") ---------------------------------

    /// `tpool create ...` → pool-handle.
    ///
    /// # Errors
    ///
    /// Propagates [`PoolOptions::validate`]'s error.
    pub fn pool_create(&self, options: PoolOptions) -> Result<PoolId, ThreadError> {
        self.pools.create(options, self.factory())
    }

    /// `tpool create` variant driven by a deserialized [`PoolConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidConfig`] if `cfg` fails validation, or
    /// propagates [`PoolOptions::validate`]'s error.
    pub fn pool_create_with_config(&self, cfg: PoolConfig) -> Result<PoolId, ThreadError> {
        cfg.validate().map_err(ThreadError::InvalidConfig)?;
        self.pool_create(cfg.into())
    }

    /// `tpool post ?-detached? pool script` → jobId or empty.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidPool`] if `pool` is unknown.
    pub fn pool_post(&self, pool: PoolId, script: String, detached: bool) -> Result<Option<u64>, ThreadError> {
        Ok(self.pools.resolve(pool)?.post(script, detached))
    }

    /// `tpool wait pool jobIdList` → (doneList, pendingList).
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidPool`] if `pool` is unknown.
    pub fn pool_wait(&self, pool: PoolId, job_ids: &[u64]) -> Result<(Vec<u64>, Vec<u64>), ThreadError> {
        Ok(self.pools.resolve(pool)?.wait(job_ids))
    }

    /// `tpool get pool jobId` → code-or-result.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidPool`], [`ThreadError::NoSuchJob`], or
    /// [`ThreadError::NotCompleted`].
    pub fn pool_get(&self, pool: PoolId, job_id: u64) -> Result<EvalOutcome, ThreadError> {
        self.pools.resolve(pool)?.collect(job_id)
    }

    /// `tpool preserve pool`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidPool`] if `pool` is unknown.
    pub fn pool_preserve(&self, pool: PoolId) -> Result<i64, ThreadError> {
        self.pools.preserve(pool)
    }

    /// `tpool release pool`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidPool`] if `pool` is unknown.
    pub fn pool_release(&self, pool: PoolId) -> Result<i64, ThreadError> {
        self.pools.release(pool)
    }

    // ---- Mutexes, rwmutexes, condvars (spec §6 "Mutexes") ---------------

    /// `mutex create ?-recursive?` → handle.
    #[must_use]
    pub fn mutex_create(&self, recursive: bool) -> String {
        let object = if recursive {
            SyncObject::Recursive(Arc::new(RecursiveMutex::new()))
        } else {
            SyncObject::Exclusive(Arc::new(ExclusiveMutex::new()))
        };
        self.handles.register(object)
    }

    /// `mutex lock handle`.
    ///
    /// # Errors
    ///
    /// [`ThreadError::NoSuchHandle`] / [`ThreadError::WrongMutexType`].
    pub fn mutex_lock(&self, handle: &str) -> Result<(), ThreadError> {
        match self.handles.resolve(handle)? {
            SyncObject::Exclusive(m) => {
                m.lock();
                Ok(())
            }
            SyncObject::Recursive(m) => {
                m.lock();
                Ok(())
            }
            _ => Err(ThreadError::WrongMutexType(handle.to_string())),
        }
    }

    /// `mutex unlock handle`.
    ///
    /// # Errors
    ///
    /// [`ThreadError::NoSuchHandle`] / [`ThreadError::WrongMutexType`].
    pub fn mutex_unlock(&self, handle: &str) -> Result<(), ThreadError> {
        match self.handles.resolve(handle)? {
            SyncObject::Exclusive(m) => {
                m.unlock();
                Ok(())
            }
            SyncObject::Recursive(m) => {
                m.unlock();
                Ok(())
            }
            _ => Err(ThreadError::WrongMutexType(handle.to_string())),
        }
    }

    /// `mutex destroy handle`. Idempotent.
    pub fn mutex_destroy(&self, handle: &str) {
        self.handles.unregister(handle);
    }

    /// `rwmutex create` → handle.
    #[must_use]
    pub fn rwmutex_create(&self) -> String {
        self.handles.register(SyncObject::ReaderWriter(Arc::new(RwMutex::new())))
    }

    /// `rwmutex rlock handle`.
    ///
    /// # Errors
    ///
    /// [`ThreadError::NoSuchHandle`] / [`ThreadError::WrongMutexType`].
    pub fn rwmutex_rlock(&self, handle: &str) -> Result<(), ThreadError> {
        self.handles.resolve_rwlock(handle)?.read_lock();
        Ok(())
    }

    /// `rwmutex wlock handle`.
    ///
    /// # Errors
    ///
    /// [`ThreadError::NoSuchHandle`] / [`ThreadError::WrongMutexType`].
    pub fn rwmutex_wlock(&self, handle: &str) -> Result<(), ThreadError> {
        self.handles.resolve_rwlock(handle)?.write_lock();
        Ok(())
    }

    /// `rwmutex unlock handle`.
    ///
    /// # Errors
    ///
    /// [`ThreadError::NoSuchHandle`] / [`ThreadError::WrongMutexType`].
    pub fn rwmutex_unlock(&self, handle: &str) -> Result<(), ThreadError> {
        self.handles.resolve_rwlock(handle)?.unlock();
        Ok(())
    }

    /// `rwmutex destroy handle`. Idempotent.
    pub fn rwmutex_destroy(&self, handle: &str) {
        self.handles.unregister(handle);
    }

    /// `cond create` → handle.
    #[must_use]
    pub fn cond_create(&self) -> String {
        self.handles.register(SyncObject::Condvar(Arc::new(CondVar::new())))
    }

    /// `cond wait handle mutexHandle ?timeoutMs?`.
    ///
    /// Remembers the `(cond, mutex)` pairing so a later `cond notify`
    /// (which, per spec §6, names only the condvar) knows which mutex's
    /// wait queue to unpark.
    ///
    /// # Errors
    ///
    /// [`ThreadError::NoSuchHandle`], [`ThreadError::WrongMutexType`],
    /// [`ThreadError::MutexNeverLocked`], or [`ThreadError::Timeout`].
    pub fn cond_wait(&self, cond_handle: &str, mutex_handle: &str, timeout_ms: Option<u64>) -> Result<(), ThreadError> {
        let cond = self.handles.resolve_condvar(cond_handle)?;
        let mutex = self.handles.resolve_exclusive(mutex_handle)?;
        self.cond_pairing.lock().insert(cond_handle.to_string(), mutex_handle.to_string());
        cond.wait(&mutex, mutex_handle, timeout_ms)
    }

    /// `cond notify handle`. A no-op if nothing has ever waited on this
    /// condvar.
    ///
    /// # Errors
    ///
    /// [`ThreadError::NoSuchHandle`] / [`ThreadError::WrongMutexType`] if
    /// the paired mutex handle no longer resolves.
    pub fn cond_notify(&self, cond_handle: &str) -> Result<(), ThreadError> {
        let cond = self.handles.resolve_condvar(cond_handle)?;
        let mutex_handle = self.cond_pairing.lock().get(cond_handle).cloned();
        if let Some(mutex_handle) = mutex_handle {
            let mutex = self.handles.resolve_exclusive(&mutex_handle)?;
            cond.notify(&mutex);
        }
        Ok(())
    }

    /// `cond destroy handle`. Idempotent.
    pub fn cond_destroy(&self, handle: &str) {
        self.handles.unregister(handle);
        self.cond_pairing.lock().remove(handle);
    }

    /// `eval -lock mutexHandle body`.
    ///
    /// # Errors
    ///
    /// [`ThreadError::NoSuchHandle`] / [`ThreadError::WrongMutexType`].
    pub fn eval_locked<T>(&self, mutex_handle: &str, body: impl FnOnce() -> T) -> Result<T, ThreadError> {
        let mutex = self.handles.resolve_exclusive(mutex_handle)?;
        Ok(locked_eval(&mutex, body))
    }

    // ---- Shared variables (spec §6 "Shared variables") ------------------

    /// `get array key`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::NotFound`] if the array or key is missing.
    pub fn tsv_get(&self, array: &str, key: &str) -> Result<String, ThreadError> {
        self.vars.get(array, key)
    }

    /// `set array key value`.
    pub fn tsv_set(&self, array: &str, key: &str, value: String) {
        self.vars.set(array, key, value);
    }

    /// `exists array key`.
    #[must_use]
    pub fn tsv_exists(&self, array: &str, key: &str) -> bool {
        self.vars.exists(array, key)
    }

    /// `incr array key ?by?`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::NotANumber`] if the current value is not an
    /// integer.
    pub fn tsv_incr(&self, array: &str, key: &str, by: i64) -> Result<i64, ThreadError> {
        self.vars.incr(array, key, by)
    }

    /// `append array key value`.
    pub fn tsv_append(&self, array: &str, key: &str, value: &str) -> String {
        self.vars.append(array, key, value)
    }

    /// `lappend array key value...`.
    pub fn tsv_lappend(&self, array: &str, key: &str, values: &[String]) -> Vec<String> {
        self.vars.lappend(array, key, values)
    }

    /// `array set array key/value...`.
    pub fn tsv_array_set(&self, array: &str, pairs: &[(String, String)]) {
        self.vars.array_set(array, pairs);
    }

    /// `array reset array key/value...`.
    pub fn tsv_array_reset(&self, array: &str, pairs: &[(String, String)]) {
        self.vars.array_reset(array, pairs);
    }

    /// `array get array`.
    #[must_use]
    pub fn tsv_array_get(&self, array: &str) -> Vec<(String, String)> {
        self.vars.array_get(array)
    }

    /// `array names array`.
    #[must_use]
    pub fn tsv_array_names(&self, array: &str) -> Vec<String> {
        self.vars.array_names(array)
    }

    /// `array size array`.
    #[must_use]
    pub fn tsv_array_size(&self, array: &str) -> usize {
        self.vars.array_size(array)
    }

    /// `array exists array`.
    #[must_use]
    pub fn tsv_array_exists(&self, array: &str) -> bool {
        self.vars.array_exists(array)
    }

    /// `unset array ?key?`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::NotFound`] if the array or key is missing.
    pub fn tsv_unset(&self, array: &str, key: Option<&str>) -> Result<(), ThreadError> {
        self.vars.unset(array, key)
    }

    /// `lpop array key ?index?`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::BadIndex`] for a malformed index spec.
    pub fn tsv_lpop(&self, array: &str, key: &str, index_spec: Option<&str>) -> Result<Option<String>, ThreadError> {
        self.vars.lpop(array, key, index_spec)
    }

    /// `lpush array key element ?index?`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::BadIndex`] for a malformed index spec.
    pub fn tsv_lpush(&self, array: &str, key: &str, element: &str, index_spec: Option<&str>) -> Result<(), ThreadError> {
        self.vars.lpush(array, key, element, index_spec)
    }

    /// `lreplace array key first last element...`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::BadIndex`] for a malformed index spec.
    pub fn tsv_lreplace(
        &self,
        array: &str,
        key: &str,
        first_spec: &str,
        last_spec: &str,
        elements: &[String],
    ) -> Result<(), ThreadError> {
        self.vars.lreplace(array, key, first_spec, last_spec, elements)
    }

    /// `linsert array key index element...`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::BadIndex`] for a malformed index spec.
    pub fn tsv_linsert(&self, array: &str, key: &str, index_spec: &str, elements: &[String]) -> Result<(), ThreadError> {
        self.vars.linsert(array, key, index_spec, elements)
    }

    /// `llength array key`.
    #[must_use]
    pub fn tsv_llength(&self, array: &str, key: &str) -> usize {
        self.vars.llength(array, key)
    }

    /// `lindex array key index`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::BadIndex`] for a malformed index spec.
    pub fn tsv_lindex(&self, array: &str, key: &str, index_spec: &str) -> Result<String, ThreadError> {
        self.vars.lindex(array, key, index_spec)
    }

    /// `lrange array key first last`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::BadIndex`] for a malformed index spec.
    pub fn tsv_lrange(&self, array: &str, key: &str, first_spec: &str, last_spec: &str) -> Result<Vec<String>, ThreadError> {
        self.vars.lrange(array, key, first_spec, last_spec)
    }

    /// `lsearch array key ?mode? pattern` → index of the first match, or
    /// `-1`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::BadIndex`] if `mode` is [`SearchMode::Regex`]
    /// and `pattern` fails to compile.
    pub fn tsv_lsearch(&self, array: &str, key: &str, mode: SearchMode, pattern: &str) -> Result<i64, ThreadError> {
        self.vars.lsearch(array, key, mode, pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::EchoInterpreter;

    fn runtime() -> Runtime {
        Runtime::new(|| Box::new(EchoInterpreter::new()))
    }

    #[test]
    fn actor_create_and_send_sync_round_trip() {
        let rt = runtime();
        let actor = rt.actor_create(None, ActorSpawnOptions::default());
        let mut caller = EchoInterpreter::new();
        let result = rt.send_sync(ActorId::new(9999), actor, "expr {2+3}".into(), &mut caller).unwrap();
        assert_eq!(result, "5");
        assert!(rt.actor_exists(actor));
        rt.actor_release(ActorId::new(9999), actor).unwrap();
    }

    #[test]
    fn actor_join_blocks_until_thread_exits() {
        let rt = runtime();
        let actor = rt.actor_create(
            None,
            ActorSpawnOptions {
                joinable: true,
                ..ActorSpawnOptions::default()
            },
        );
        rt.send_async(actor, "exit".into()).unwrap();
        rt.actor_join(actor).unwrap();
        assert!(rt.actor_join(actor).is_err());
    }

    #[test]
    fn pool_post_and_get_round_trip() {
        let rt = runtime();
        let pool = rt
            .pool_create(PoolOptions {
                min_workers: 1,
                max_workers: 2,
                ..PoolOptions::default()
            })
            .unwrap();
        let job_id = rt.pool_post(pool, "expr {4+5}".into(), false).unwrap().unwrap();
        rt.pool_wait(pool, &[job_id]).unwrap();
        let outcome = rt.pool_get(pool, job_id).unwrap();
        assert_eq!(outcome.result, "9");
        rt.pool_release(pool).unwrap();
    }

    #[test]
    fn mutex_lock_unlock_round_trips() {
        let rt = runtime();
        let handle = rt.mutex_create(false);
        rt.mutex_lock(&handle).unwrap();
        rt.mutex_unlock(&handle).unwrap();
        rt.mutex_destroy(&handle);
        assert!(rt.mutex_lock(&handle).is_err());
    }

    #[test]
    fn rwmutex_read_then_write() {
        let rt = runtime();
        let handle = rt.rwmutex_create();
        rt.rwmutex_rlock(&handle).unwrap();
        rt.rwmutex_unlock(&handle).unwrap();
        rt.rwmutex_wlock(&handle).unwrap();
        rt.rwmutex_unlock(&handle).unwrap();
    }

    #[test]
    fn cond_notify_wakes_waiter_without_explicit_mutex_on_notify() {
        use std::sync::Arc as StdArc;
        use std::thread;

        let rt = StdArc::new(runtime());
        let mutex_handle = rt.mutex_create(false);
        let cond_handle = rt.cond_create();

        let rt2 = StdArc::clone(&rt);
        let mutex_handle2 = mutex_handle.clone();
        let cond_handle2 = cond_handle.clone();
        let waiter = thread::spawn(move || {
            rt2.mutex_lock(&mutex_handle2).unwrap();
            // `cond_wait` releases the lock while parked, so this does not
            // deadlock against the main thread's own `lock()` below.
            rt2.cond_wait(&cond_handle2, &mutex_handle2, Some(2_000)).unwrap();
            rt2.mutex_unlock(&mutex_handle2).unwrap();
        });

        // Give the waiter time to lock, enter `cond_wait`, and park before
        // notifying; otherwise the notify could fire before anyone parked.
        thread::sleep(std::time::Duration::from_millis(30));
        rt.mutex_lock(&mutex_handle).unwrap();
        rt.cond_notify(&cond_handle).unwrap();
        rt.mutex_unlock(&mutex_handle).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn shared_variables_round_trip_through_runtime() {
        let rt = runtime();
        rt.tsv_set("arr", "k", "v".into());
        assert_eq!(rt.tsv_get("arr", "k").unwrap(), "v");
        assert_eq!(rt.tsv_incr("arr", "n", 3).unwrap(), 3);
        let list = rt.tsv_lappend("arr", "l", &["a".into(), "b".into()]);
        assert_eq!(list, vec!["a", "b"]);
        assert_eq!(rt.tsv_llength("arr", "l"), 2);
    }

    #[test]
    fn error_handler_can_be_set_and_cleared() {
        let rt = runtime();
        let handler = rt.actor_create(None, ActorSpawnOptions::default());
        rt.set_error_handler(handler, "onError".into());
        rt.clear_error_handler();
        rt.actor_release(ActorId::new(9999), handler).unwrap();
    }
}
