//! Send/reply engine (component E, spec §4.E) and the ticket-arena redesign
//! of spec §9's cyclic job/slot pointers.
//!
//! A synchronous send's result slot and a transfer's result slot are each
//! held in their own arena, keyed by a monotonically increasing
//! [`SlotTicket`] rather than linked in a doubly-linked list with
//! back-pointers into the job that owns them. The job carries only the
//! ticket; walking "every in-flight slot" on peer death is an iteration
//! over the arena's map under its one guarding lock, which is the
//! invariant spec §9 actually requires (every synchronous send owns
//! exactly one slot, freed exactly once) — not the specific pointer
//! representation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::actor::lifecycle::ActorContext;
use crate::actor::mailbox::Job;
use crate::actor::registry::ActorId;
use crate::error::ThreadError;
use crate::script::{EvalOutcome, Interpreter};

/// Opaque key into a [`ResultArena`] or [`TransferArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotTicket(u64);

/// The outcome of a completed slot, including the synthetic case where the
/// destination actor died before answering.
#[derive(Debug, Clone)]
pub enum SlotOutcome {
    /// The target evaluated the job and produced this outcome.
    Completed(EvalOutcome),
    /// The target exited before completing the job.
    TargetDied,
}

struct Slot {
    source: ActorId,
    dest: ActorId,
    state: Mutex<Option<SlotOutcome>>,
    ready: Condvar,
}

/// A synchronous send's in-flight result slots, keyed by ticket.
#[derive(Default)]
pub struct ResultArena {
    slots: Mutex<HashMap<SlotTicket, Arc<Slot>>>,
    counter: AtomicU64,
}

impl ResultArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new pending slot for a send from `source` to `dest`.
    pub fn allocate(&self, source: ActorId, dest: ActorId) -> SlotTicket {
        let ticket = SlotTicket(self.counter.fetch_add(1, Ordering::Relaxed));
        let slot = Arc::new(Slot {
            source,
            dest,
            state: Mutex::new(None),
            ready: Condvar::new(),
        });
        self.slots.lock().insert(ticket, slot);
        ticket
    }

    /// Complete `ticket` with the target's evaluation outcome, waking the
    /// blocked sender. A no-op if the ticket is unknown (already cleaned
    /// up by a concurrent death-of-peer walk).
    pub fn complete(&self, ticket: SlotTicket, outcome: EvalOutcome) {
        if let Some(slot) = self.slots.lock().get(&ticket).cloned() {
            *slot.state.lock() = Some(SlotOutcome::Completed(outcome));
            slot.ready.notify_all();
        }
    }

    /// Block until `ticket` is completed (or `timeout` elapses), then
    /// remove and return its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::Timeout`] if `timeout` elapses first, or
    /// [`ThreadError::NoSuchJob`] if the ticket is not (or no longer)
    /// registered.
    pub fn wait(&self, ticket: SlotTicket, timeout: Option<Duration>) -> Result<SlotOutcome, ThreadError> {
        let slot = self
            .slots
            .lock()
            .get(&ticket)
            .cloned()
            .ok_or(ThreadError::NoSuchJob(ticket.0))?;
        let mut state = slot.state.lock();
        loop {
            if let Some(outcome) = state.take() {
                self.slots.lock().remove(&ticket);
                return Ok(outcome);
            }
            match timeout {
                Some(d) => {
                    let result = slot.ready.wait_for(&mut state, d);
                    if result.timed_out() && state.is_none() {
                        self.slots.lock().remove(&ticket);
                        return Err(ThreadError::Timeout);
                    }
                }
                None => slot.ready.wait(&mut state),
            }
        }
    }

    /// Death-of-peer walk (spec §4.E): complete every pending slot whose
    /// destination is `dead` with [`SlotOutcome::TargetDied`], and drop
    /// every pending slot whose source is `dead` (its waiter is gone).
    pub fn handle_peer_death(&self, dead: ActorId) {
        let slots = self.slots.lock();
        for slot in slots.values() {
            if slot.dest == dead {
                let mut state = slot.state.lock();
                if state.is_none() {
                    *state = Some(SlotOutcome::TargetDied);
                    slot.ready.notify_all();
                }
            }
        }
        drop(slots);
        self.slots.lock().retain(|_, slot| slot.source != dead || slot.state.lock().is_some());
    }
}

/// In-flight `thread::transfer` slots; same shape and death-handling rules
/// as [`ResultArena`], kept separate per spec §3's "Transfer job" being its
/// own record type.
#[derive(Default)]
pub struct TransferArena {
    inner: ResultArena,
}

impl TransferArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a transfer slot.
    pub fn allocate(&self, source: ActorId, dest: ActorId) -> SlotTicket {
        self.inner.allocate(source, dest)
    }

    /// Complete a transfer with `result` (`Ok(())` on success,
    /// `Err(ThreadError::ChannelExists(_))` if the target already had a
    /// same-named channel).
    pub fn complete(&self, ticket: SlotTicket, result: Result<(), ThreadError>) {
        let outcome = match result {
            Ok(()) => EvalOutcome::ok(""),
            Err(e) => EvalOutcome::error("ECHANNELEXISTS", "", e.to_string()),
        };
        self.inner.complete(ticket, outcome);
    }

    /// Block for the transfer's result.
    pub fn wait(&self, ticket: SlotTicket) -> Result<(), ThreadError> {
        match self.inner.wait(ticket, None)? {
            SlotOutcome::TargetDied => Err(ThreadError::TargetDied),
            SlotOutcome::Completed(outcome) if outcome.ok => Ok(()),
            SlotOutcome::Completed(outcome) => Err(ThreadError::ChannelExists(outcome.result)),
        }
    }

    /// Death-of-peer walk, delegated to the inner arena.
    pub fn handle_peer_death(&self, dead: ActorId) {
        self.inner.handle_peer_death(dead);
    }
}

/// The producer half of an async-with-callback send (spec §4.E, §9): the
/// target's settlement of this promise is a [`crate::actor::mailbox::Job::Callback`]
/// sent back to the origin, not a shared slot the origin blocks on — the
/// origin only ever touches its own interpreter from its own thread.
pub struct Promise {
    pub(crate) origin: ActorId,
    pub(crate) var_name: String,
}

impl Promise {
    /// Create a promise that will settle by setting `var_name` in
    /// `origin`'s interpreter.
    #[must_use]
    pub fn new(origin: ActorId, var_name: String) -> Self {
        Self { origin, var_name }
    }

    /// Convert this promise into the settlement the target uses once it
    /// has evaluated the callback's script.
    #[must_use]
    pub fn into_settlement(self) -> Settlement {
        Settlement {
            origin: self.origin,
            var_name: self.var_name,
        }
    }
}

/// The consumer half: held by the target actor after it evaluates the
/// callback script, used to build the [`crate::actor::mailbox::Job::Callback`]
/// routed back to the origin.
pub struct Settlement {
    pub(crate) origin: ActorId,
    pub(crate) var_name: String,
}

impl Settlement {
    /// The actor this settlement must be delivered to.
    #[must_use]
    pub fn origin(&self) -> ActorId {
        self.origin
    }

    /// The variable name the origin's interpreter should receive.
    #[must_use]
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

/// `thread::send id script` (spec §4.E algorithm for `SendSync`).
///
/// If `target` is `caller`, `script` runs inline on `interp` without
/// touching the mailbox at all (spec §8 "at-most-once inline"). Otherwise
/// it blocks on a freshly allocated result slot until the target answers
/// or dies.
///
/// # Errors
///
/// - [`ThreadError::InvalidTarget`] if `target` does not resolve.
/// - [`ThreadError::TargetDied`] if the target exits before completing
///   the job.
/// - [`ThreadError::ScriptError`] if the target's evaluation failed.
pub fn send_sync(
    ctx: &ActorContext,
    caller: ActorId,
    target: ActorId,
    script: String,
    interp: &mut dyn Interpreter,
) -> Result<String, ThreadError> {
    if target == caller {
        let outcome = interp.eval(&script);
        return outcome_to_result(outcome);
    }

    let record = ctx.registry.resolve(target)?;
    let ticket = ctx.results.allocate(caller, target);
    record.note_enqueued();
    record
        .mailbox()
        .send(Job::Eval { script, ticket: Some(ticket) })
        .map_err(|_| ThreadError::TargetDied)?;

    match ctx.results.wait(ticket, None)? {
        SlotOutcome::TargetDied => Err(ThreadError::TargetDied),
        SlotOutcome::Completed(outcome) => outcome_to_result(outcome),
    }
}

/// `thread::send -async id script` (spec §4.E algorithm for `SendAsync`,
/// no callback): fire-and-forget, subject only to the target's event-mark
/// backpressure.
///
/// # Errors
///
/// Returns [`ThreadError::InvalidTarget`] if `target` does not resolve.
pub fn send_async(ctx: &ActorContext, target: ActorId, script: String) -> Result<(), ThreadError> {
    let record = ctx.registry.resolve(target)?;
    record.wait_for_backpressure();
    record.note_enqueued();
    let _ = record.mailbox().send(Job::Eval { script, ticket: None });
    Ok(())
}

/// `thread::send -async id script varName` (spec §4.E "SendAsyncWithCallback"):
/// the target evaluates `script`, then the result is routed back to
/// `origin` as a [`Job::Callback`] that sets `var_name` (and, on error,
/// `errorCode`/`errorInfo`) in the origin's own interpreter.
///
/// # Errors
///
/// Returns [`ThreadError::InvalidTarget`] if `target` does not resolve.
pub fn send_async_with_callback(
    ctx: &ActorContext,
    origin: ActorId,
    target: ActorId,
    script: String,
    var_name: String,
) -> Result<(), ThreadError> {
    let record = ctx.registry.resolve(target)?;
    record.wait_for_backpressure();
    record.note_enqueued();
    let _ = record.mailbox().send(Job::EvalWithCallback { script, origin, var_name });
    Ok(())
}

/// `thread::transfer id channel` (spec §4.E "Transfer"): hand the named
/// channel's ownership from `caller` to `target`, blocking until the
/// target accepts or rejects it.
///
/// # Errors
///
/// - [`ThreadError::InvalidTarget`] if `target` does not resolve.
/// - [`ThreadError::ChannelNotRegistered`] / [`ThreadError::ChannelShared`]
///   if `caller` cannot give up the channel.
/// - [`ThreadError::ChannelExists`] if `target` already owns a same-named
///   channel — `caller` keeps ownership on this path (spec §9: the
///   registry mutex is still unlocked exactly once here, not twice).
/// - [`ThreadError::TargetDied`] if `target` exits before accepting.
pub fn transfer(ctx: &ActorContext, caller: ActorId, target: ActorId, channel: String) -> Result<(), ThreadError> {
    let record = ctx.registry.resolve(target)?;
    let ticket = ctx.transfers.allocate(caller, target);
    record
        .mailbox()
        .send(Job::Transfer { channel, origin: caller, ticket })
        .map_err(|_| ThreadError::TargetDied)?;
    ctx.transfers.wait(ticket)
}

fn outcome_to_result(outcome: EvalOutcome) -> Result<String, ThreadError> {
    if outcome.ok {
        Ok(outcome.result)
    } else {
        Err(ThreadError::ScriptError {
            code: outcome.error_code,
            info: outcome.error_info,
            message: outcome.result,
        })
    }
}
