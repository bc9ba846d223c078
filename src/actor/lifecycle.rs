//! Worker lifecycle (component F, spec §4.F): spawn/bootstrap, the worker
//! main loop, reserve/release, unwind, the hard `ExitThread` abort, and
//! error-handler reporting.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::actor::channel::ChannelRegistry;
use crate::actor::mailbox::{mailbox, Job, MailboxReceiver};
use crate::actor::registry::{ActorId, ActorRegistry};
use crate::actor::send::{ResultArena, TransferArena};
use crate::error::ThreadError;
use crate::script::{EvalOutcome, Interpreter};

/// Process-wide collaborators every actor thread needs a handle to.
///
/// Grouped into one `Arc`'d struct (rather than four separate `Arc`
/// clones threaded through every call) the way the teacher's worker pool
/// bundles its queue/result-storage/counters into one cloned context per
/// spawned thread.
pub struct ActorContext {
    /// The actor registry.
    pub registry: Arc<ActorRegistry>,
    /// In-flight synchronous-send result slots.
    pub results: Arc<ResultArena>,
    /// In-flight `transfer` slots.
    pub transfers: Arc<TransferArena>,
    /// Channel ownership table.
    pub channels: Arc<ChannelRegistry>,
    /// The configured error-handler target, if any (spec §4.F).
    pub error_handler: Mutex<Option<ErrorHandler>>,
}

impl Default for ActorContext {
    fn default() -> Self {
        Self {
            registry: Arc::new(ActorRegistry::new()),
            results: Arc::new(ResultArena::new()),
            transfers: Arc::new(TransferArena::new()),
            channels: Arc::new(ChannelRegistry::new()),
            error_handler: Mutex::new(None),
        }
    }
}

impl ActorContext {
    /// Create a fresh context with empty registries and no error handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an unhandled script error (spec §4.F): SendAsync the
    /// configured handler script to the designated worker, or write to
    /// standard error if none is configured.
    pub fn report_error(&self, offender: ActorId, outcome: &EvalOutcome) {
        let handler = self.error_handler.lock().clone();
        match handler {
            Some(h) => {
                if let Some(target) = self.registry.lookup(h.target) {
                    let script = format!("{} {} {}", h.script_name, offender, outcome.error_info);
                    target.note_enqueued();
                    let _ = target.mailbox().send(Job::Eval { script, ticket: None });
                } else {
                    warn!(offender = %offender, "error handler target no longer exists");
                }
            }
            None => {
                error!(offender = %offender, error = %outcome.result, "unhandled script error");
            }
        }
    }
}

/// The process-wide error-handler registration (spec §4.F).
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    /// The actor to notify.
    pub target: ActorId,
    /// The script-name argument passed alongside `(offender, errorInfo)`.
    pub script_name: String,
}

/// Options controlling a new actor's spawn (spec §6 `-joinable`,
/// `-eventmark`, `-unwindonerror`).
#[derive(Debug, Clone, Default)]
pub struct ActorSpawnOptions {
    /// Keep the `JoinHandle` so a caller can later join the OS thread.
    pub joinable: bool,
    /// Backpressure threshold for asynchronous sends (spec §4.D).
    pub event_mark: Option<u64>,
    /// Whether a script error should additionally stop this actor.
    pub unwind_on_error: bool,
}

/// A newly spawned actor: its id and, if `joinable` was set, a handle the
/// caller can block on.
pub struct SpawnedActor {
    /// The new actor's id.
    pub id: ActorId,
    /// Present only when [`ActorSpawnOptions::joinable`] was set.
    pub join_handle: Option<JoinHandle<()>>,
}

struct ReadyGate {
    state: Mutex<bool>,
    signal: Condvar,
}

impl ReadyGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    fn wait(&self) {
        let mut ready = self.state.lock();
        while !*ready {
            self.signal.wait(&mut ready);
        }
    }

    fn fire(&self) {
        *self.state.lock() = true;
        self.signal.notify_all();
    }
}

/// Spawn a new actor running `make_interp()` on its own OS thread,
/// evaluating `bootstrap` (if any) before entering its event loop.
///
/// Blocks the calling thread until the worker has inserted itself into
/// the registry (spec §4.F "caller blocks on the condvar until the worker
/// ... inserted itself into the registry").
pub fn spawn<I, F>(ctx: Arc<ActorContext>, bootstrap: Option<String>, make_interp: F, opts: ActorSpawnOptions) -> SpawnedActor
where
    I: Interpreter,
    F: FnOnce() -> I + Send + 'static,
{
    let id = ctx.registry.next_id();
    let (tx, rx) = mailbox();
    let gate = Arc::new(ReadyGate::new());
    let gate_for_thread = Arc::clone(&gate);
    let ctx_for_thread = Arc::clone(&ctx);
    let unwind_on_error = opts.unwind_on_error;
    let event_mark = opts.event_mark;

    let builder = std::thread::Builder::new().name(format!("actor-{id}"));
    let handle = builder
        .spawn(move || {
            let mut interp = make_interp();
            let record = ctx_for_thread.registry.insert(tx, id, event_mark);
            record.set_unwind_on_error(unwind_on_error);
            gate_for_thread.fire();
            if let Some(script) = bootstrap {
                let outcome = interp.eval(&script);
                if !outcome.ok {
                    ctx_for_thread.report_error(id, &outcome);
                }
            }
            info!(actor = %id, "actor entered event loop");
            run_event_loop(id, &mut interp, &rx, &ctx_for_thread);
        })
        .expect("failed to spawn actor thread");

    gate.wait();

    SpawnedActor {
        id,
        join_handle: opts.joinable.then_some(handle),
    }
}

fn run_event_loop(id: ActorId, interp: &mut impl Interpreter, rx: &MailboxReceiver, ctx: &Arc<ActorContext>) {
    while let Ok(job) = rx.recv() {
        match job {
            Job::Eval { script, ticket } => {
                let outcome = interp.eval(&script);
                if interp.wants_exit() || interp.wants_hard_exit() {
                    // The script is leaving the event loop on its own terms
                    // (spec §8 scenario 3: `send A "exit"`). Leave the slot
                    // pending rather than completing it with this job's own
                    // result — `teardown`'s peer-death walk is what a
                    // blocked sync sender should observe here, resolving
                    // the send as `TargetDied` instead.
                } else {
                    match ticket {
                        Some(t) => ctx.results.complete(t, outcome),
                        None if !outcome.ok => ctx.report_error(id, &outcome),
                        None => {}
                    }
                }
            }
            Job::EvalWithCallback { script, origin, var_name } => {
                let outcome = interp.eval(&script);
                if let Some(target) = ctx.registry.lookup(origin) {
                    target.note_enqueued();
                    let _ = target.mailbox().send(Job::Callback {
                        var_name,
                        ok: outcome.ok,
                        result: outcome.result,
                        error_code: outcome.error_code,
                        error_info: outcome.error_info,
                    });
                }
            }
            Job::Callback { var_name, ok, result, error_code, error_info } => {
                interp.set_var(&var_name, &result);
                if !ok {
                    interp.set_var("errorCode", &error_code);
                    interp.set_var("errorInfo", &error_info);
                }
            }
            Job::Transfer { channel, origin, ticket } => {
                let result = ctx.channels.transfer(&channel, origin, id);
                ctx.transfers.complete(ticket, result);
            }
            Job::Wake => {}
        }

        if let Some(record) = ctx.registry.lookup(id) {
            record.note_processed();
        }

        if interp.wants_hard_exit() {
            debug!(actor = %id, "hard exit, skipping teardown");
            return;
        }

        let stopped = ctx.registry.lookup(id).is_none_or(|r| r.flags().stopped) || interp.wants_exit();
        if stopped {
            if let Some(record) = ctx.registry.lookup(id) {
                record.mark_stopped();
            }
            break;
        }
    }

    teardown(id, ctx);
}

fn teardown(id: ActorId, ctx: &Arc<ActorContext>) {
    info!(actor = %id, "actor leaving event loop");
    ctx.registry.remove(id);
    ctx.results.handle_peer_death(id);
    ctx.transfers.handle_peer_death(id);
    ctx.channels.drop_owner(id);
}

/// `thread::preserve`/`thread::release` (spec §4.F). A release that drops
/// the refcount to zero or below stops the target (waking it with a
/// [`Job::Wake`] if it isn't the caller itself) and removes it from the
/// registry's visible set immediately — the worker's own teardown runs
/// later, when its thread notices `Stopped` and exits.
///
/// # Errors
///
/// Returns [`ThreadError::InvalidTarget`] if `id` is not a live actor.
pub fn release(ctx: &ActorContext, caller: ActorId, id: ActorId) -> Result<i64, ThreadError> {
    let record = ctx.registry.resolve(id)?;
    let remaining = record.release();
    if remaining <= 0 {
        record.mark_stopped();
        if id != caller {
            let _ = record.mailbox().send(Job::Wake);
        }
    }
    Ok(remaining)
}

/// `thread::preserve`.
///
/// # Errors
///
/// Returns [`ThreadError::InvalidTarget`] if `id` is not a live actor.
pub fn preserve(ctx: &ActorContext, id: ActorId) -> Result<i64, ThreadError> {
    Ok(ctx.registry.resolve(id)?.preserve())
}

/// `thread::unwind`: a release-self that forces the calling actor's event
/// loop to exit after the current event returns.
///
/// # Errors
///
/// Returns [`ThreadError::InvalidTarget`] if `caller` is not a live actor.
pub fn unwind(ctx: &ActorContext, caller: ActorId) -> Result<(), ThreadError> {
    let record = ctx.registry.resolve(caller)?;
    record.mark_stopped();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::EchoInterpreter;
    use std::time::Duration;

    fn echo(ctx: Arc<ActorContext>, opts: ActorSpawnOptions) -> SpawnedActor {
        spawn(ctx, None, EchoInterpreter::new, opts)
    }

    #[test]
    fn spawned_actor_is_registered_and_reachable() {
        let ctx = Arc::new(ActorContext::new());
        let actor = echo(Arc::clone(&ctx), ActorSpawnOptions::default());
        assert!(ctx.registry.exists(actor.id));

        let ticket = ctx.results.allocate(ActorId::new(9999), actor.id);
        let mailbox = ctx.registry.lookup(actor.id).unwrap().mailbox();
        mailbox
            .send(Job::Eval {
                script: "expr {2+3}".into(),
                ticket: Some(ticket),
            })
            .unwrap();
        let outcome = ctx.results.wait(ticket, Some(Duration::from_secs(1))).unwrap();
        match outcome {
            crate::actor::send::SlotOutcome::Completed(o) => assert_eq!(o.result, "5"),
            crate::actor::send::SlotOutcome::TargetDied => panic!("actor died unexpectedly"),
        }

        release(&ctx, ActorId::new(9999), actor.id).unwrap();
    }

    #[test]
    fn release_to_zero_eventually_removes_actor() {
        let ctx = Arc::new(ActorContext::new());
        let actor = echo(Arc::clone(&ctx), ActorSpawnOptions::default());
        release(&ctx, ActorId::new(9999), actor.id).unwrap();
        for _ in 0..50 {
            if !ctx.registry.exists(actor.id) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("actor was not removed after release to zero");
    }

    #[test]
    fn target_death_unblocks_pending_sync_send() {
        let ctx = Arc::new(ActorContext::new());
        let actor = echo(Arc::clone(&ctx), ActorSpawnOptions::default());
        let ticket = ctx.results.allocate(ActorId::new(9999), actor.id);
        release(&ctx, ActorId::new(9999), actor.id).unwrap();
        let outcome = ctx.results.wait(ticket, Some(Duration::from_secs(2))).unwrap();
        assert!(matches!(outcome, crate::actor::send::SlotOutcome::TargetDied));
    }
}
