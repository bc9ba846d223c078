//! An actor's mailbox (spec §4.D): the channel a worker blocks on in place
//! of a host-provided event queue. A blocking `recv()` on the receiving
//! half *is* the worker's event loop wait point; sending to the paired
//! sender *is* the notifier/"alert thread" step spec §6 folds into one
//! concept for a library with no separate host notifier to call into.

use crate::actor::registry::ActorId;
use crate::actor::send::SlotTicket;

/// One unit of work delivered to an actor's mailbox.
pub enum Job {
    /// Evaluate `script`. `ticket` is `Some` for a synchronous send (the
    /// caller is blocked waiting on that result slot) and `None` for a
    /// fire-and-forget asynchronous send.
    Eval {
        /// The script text to evaluate.
        script: String,
        /// The result slot to complete, if any waiter is blocked on it.
        ticket: Option<SlotTicket>,
    },
    /// Evaluate `script`, then asynchronously deliver the outcome back to
    /// `origin` as a [`Job::Callback`] that sets `var_name`
    /// (spec §4.E "async-with-callback").
    EvalWithCallback {
        /// The script text to evaluate.
        script: String,
        /// The actor that should receive the callback.
        origin: ActorId,
        /// The variable name to set in the origin's interpreter.
        var_name: String,
    },
    /// Deliver a previously-evaluated outcome into this actor's
    /// interpreter by setting `var_name` (and, on error, `errorCode`/
    /// `errorInfo`).
    Callback {
        /// The variable to set with the result string.
        var_name: String,
        /// `true` if the originating evaluation succeeded.
        ok: bool,
        /// The result string (or error message).
        result: String,
        /// The originating interpreter's errorCode, if `ok` is `false`.
        error_code: String,
        /// The originating interpreter's errorInfo, if `ok` is `false`.
        error_info: String,
    },
    /// A channel handed off via `thread::transfer`; `ticket` identifies the
    /// transfer slot the source is blocked on.
    Transfer {
        /// The channel's name.
        channel: String,
        /// The actor that owned the channel before this transfer.
        origin: ActorId,
        /// The transfer result slot to complete.
        ticket: SlotTicket,
    },
    /// A no-op event whose only purpose is to unblock a worker's
    /// `recv()` so it can notice its `Stopped` flag was set by another
    /// thread's `Release`.
    Wake,
}

/// A mailbox's sending half, held by the actor registry and by anyone
/// sending to this actor.
pub type MailboxSender = crossbeam_channel::Sender<Job>;

/// A mailbox's receiving half, owned exclusively by the actor's own
/// worker thread.
pub type MailboxReceiver = crossbeam_channel::Receiver<Job>;

/// Create a fresh, unbounded mailbox pair.
///
/// Unbounded because spec §4.D's backpressure (event-mark) is enforced by
/// senders waiting on the target's condvar *before* sending, not by the
/// channel itself blocking — the channel is just the queue.
#[must_use]
pub fn mailbox() -> (MailboxSender, MailboxReceiver) {
    crossbeam_channel::unbounded()
}
