//! Actor registry (component D, spec §4.D).
//!
//! An ordered map guarded by one mutex stands in for spec §3's
//! "doubly-linked list of actor records": the invariant that matters is a
//! single lock guarding insert/remove/lookup with `O(log n)`-or-better
//! access, not the specific link representation (spec §9's redesign note).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::actor::mailbox::MailboxSender;
use crate::error::ThreadError;
use crate::util::IdCounter;

/// Unique identity of one actor, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    /// Wrap a raw id. Public so a caller acting on behalf of a known
    /// identity it didn't spawn itself — `main`, in the scenarios this
    /// crate's tests model — can name itself as `caller`/`origin` without
    /// the runtime having to invent a channel for that purpose.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id, as surfaced to scripts (spec §6 `thread::id`).
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flags carried on an actor record (spec §3).
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorFlags {
    /// Set once the actor has left (or is leaving) its event loop; a
    /// stopped actor is invisible to `Lookup` even if its record briefly
    /// lingers.
    pub stopped: bool,
    /// If set, any script error in this actor additionally stops it
    /// (spec §4.F).
    pub unwind_on_error: bool,
}

/// One actor's registry entry.
pub struct ActorRecord {
    id: ActorId,
    mailbox: MailboxSender,
    flags: Mutex<ActorFlags>,
    refcount: AtomicI64,
    pending_events: AtomicU64,
    event_mark: Option<u64>,
    backpressure_state: Mutex<()>,
    backpressure: Condvar,
}

impl ActorRecord {
    /// This actor's id.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// A clone of the sending half of this actor's mailbox.
    #[must_use]
    pub fn mailbox(&self) -> MailboxSender {
        self.mailbox.clone()
    }

    /// Current flags.
    #[must_use]
    pub fn flags(&self) -> ActorFlags {
        *self.flags.lock()
    }

    /// Set the `Stopped` flag.
    pub fn mark_stopped(&self) {
        self.flags.lock().stopped = true;
    }

    /// Set or clear `UnwindOnError`.
    pub fn set_unwind_on_error(&self, value: bool) {
        self.flags.lock().unwind_on_error = value;
    }

    /// Current reservation count.
    #[must_use]
    pub fn refcount(&self) -> i64 {
        self.refcount.load(Ordering::SeqCst)
    }

    /// Increment the reservation count (`thread::preserve`).
    pub fn preserve(&self) -> i64 {
        self.refcount.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Decrement the reservation count (`thread::release`), returning the
    /// value after decrement.
    pub fn release(&self) -> i64 {
        self.refcount.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Block the calling (sender's) thread while this actor's pending
    /// event count exceeds its event-mark, per spec §4.D backpressure.
    pub fn wait_for_backpressure(&self) {
        let Some(mark) = self.event_mark else { return };
        let mut guard = self.backpressure_state.lock();
        while self.pending_events.load(Ordering::SeqCst) > mark {
            self.backpressure.wait(&mut guard);
        }
    }

    /// Record that one more event was enqueued for this actor.
    pub fn note_enqueued(&self) {
        self.pending_events.fetch_add(1, Ordering::SeqCst);
    }

    /// Record that this actor finished processing one event, waking any
    /// sender blocked on backpressure.
    pub fn note_processed(&self) {
        self.pending_events.fetch_sub(1, Ordering::SeqCst);
        let _guard = self.backpressure_state.lock();
        self.backpressure.notify_all();
    }
}

/// The process-wide actor registry.
#[derive(Default)]
pub struct ActorRegistry {
    records: Mutex<BTreeMap<ActorId, Arc<ActorRecord>>>,
    counter: IdCounter,
}

impl ActorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id without inserting a record (used by the worker
    /// bootstrap sequence, which must know its own id before it has
    /// finished constructing its record).
    pub(crate) fn next_id(&self) -> ActorId {
        ActorId(self.counter.next())
    }

    /// Insert `record`, completing a worker's bootstrap (spec §4.F
    /// "insert itself into the registry").
    pub fn insert(&self, mailbox: MailboxSender, id: ActorId, event_mark: Option<u64>) -> Arc<ActorRecord> {
        let record = Arc::new(ActorRecord {
            id,
            mailbox,
            flags: Mutex::new(ActorFlags::default()),
            refcount: AtomicI64::new(1),
            pending_events: AtomicU64::new(0),
            event_mark,
            backpressure_state: Mutex::new(()),
            backpressure: Condvar::new(),
        });
        self.records.lock().insert(id, Arc::clone(&record));
        record
    }

    /// `Lookup(id)`: find a live (non-Stopped) actor record.
    #[must_use]
    pub fn lookup(&self, id: ActorId) -> Option<Arc<ActorRecord>> {
        self.records
            .lock()
            .get(&id)
            .filter(|r| !r.flags().stopped)
            .cloned()
    }

    /// Resolve `id` to a live record or fail with
    /// [`ThreadError::InvalidTarget`].
    pub fn resolve(&self, id: ActorId) -> Result<Arc<ActorRecord>, ThreadError> {
        self.lookup(id).ok_or(ThreadError::InvalidTarget(id.0))
    }

    /// Remove `id` from the registry (spec §4.D "Remove").
    pub fn remove(&self, id: ActorId) {
        self.records.lock().remove(&id);
    }

    /// `thread::names`: ids of all currently live actors.
    #[must_use]
    pub fn names(&self) -> Vec<ActorId> {
        self.records.lock().keys().copied().collect()
    }

    /// `thread::exists`.
    #[must_use]
    pub fn exists(&self, id: ActorId) -> bool {
        self.lookup(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_mailbox() -> MailboxSender {
        crate::actor::mailbox::mailbox().0
    }

    #[test]
    fn insert_then_lookup_succeeds() {
        let registry = ActorRegistry::new();
        let id = registry.next_id();
        registry.insert(dummy_mailbox(), id, None);
        assert!(registry.lookup(id).is_some());
        assert!(registry.exists(id));
    }

    #[test]
    fn stopped_actor_is_not_looked_up() {
        let registry = ActorRegistry::new();
        let id = registry.next_id();
        let record = registry.insert(dummy_mailbox(), id, None);
        record.mark_stopped();
        assert!(registry.lookup(id).is_none());
    }

    #[test]
    fn unknown_id_fails_invalid_target() {
        let registry = ActorRegistry::new();
        assert!(matches!(
            registry.resolve(ActorId::new(999)),
            Err(ThreadError::InvalidTarget(999))
        ));
    }

    #[test]
    fn reservation_preserve_and_release() {
        let registry = ActorRegistry::new();
        let id = registry.next_id();
        let record = registry.insert(dummy_mailbox(), id, None);
        assert_eq!(record.refcount(), 1);
        assert_eq!(record.preserve(), 2);
        assert_eq!(record.release(), 1);
        assert_eq!(record.release(), 0);
    }

    #[test]
    fn event_mark_backpressure_releases_after_processed() {
        let registry = ActorRegistry::new();
        let id = registry.next_id();
        let record = registry.insert(dummy_mailbox(), id, Some(1));
        record.note_enqueued();
        record.note_enqueued();
        let record2 = Arc::clone(&record);
        let handle = std::thread::spawn(move || {
            record2.wait_for_backpressure();
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        record.note_processed();
        handle.join().unwrap();
    }
}
