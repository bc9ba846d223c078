//! Exclusive (non-reentrant) mutex (spec §4.B).
//!
//! Script-level lock/unlock are two independent calls rather than a scope
//! guard, so this type is built directly on [`lock_api::RawMutex`] (the
//! trait `parking_lot::RawMutex` implements) instead of `parking_lot::Mutex`'s
//! RAII guard. `RawMutex::INIT` is a `const`, giving the lazy,
//! allocation-free initialization spec §4.B calls for without a separate
//! "first lock" check.
//!
//! # Safety
//!
//! [`ExclusiveMutex::unlock`] requires that the calling thread currently
//! holds the lock (the same contract the script-level `mutex unlock`
//! command relies on the caller to honor); violating it is a logic error in
//! the embedding script, not something this type can check without extra
//! bookkeeping the source implementation itself does not keep either.

use std::sync::atomic::{AtomicBool, Ordering};

use lock_api::RawMutex as _;

/// A non-reentrant mutex exposed as explicit `lock`/`unlock` calls.
pub struct ExclusiveMutex {
    raw: parking_lot::RawMutex,
    ever_locked: AtomicBool,
}

impl Default for ExclusiveMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusiveMutex {
    /// Create a new, unlocked mutex.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
            ever_locked: AtomicBool::new(false),
        }
    }

    /// Block until the lock is acquired.
    pub fn lock(&self) {
        self.raw.lock();
        self.ever_locked.store(true, Ordering::Relaxed);
    }

    /// Attempt to acquire the lock without blocking.
    #[must_use]
    pub fn try_lock(&self) -> bool {
        let acquired = self.raw.try_lock();
        if acquired {
            self.ever_locked.store(true, Ordering::Relaxed);
        }
        acquired
    }

    /// Release the lock. The caller must currently hold it.
    pub fn unlock(&self) {
        // SAFETY: callers of this crate's `mutex unlock` operation are only
        // ever routed here after a matching `lock`/`try_lock` succeeded on
        // the same thread; see the module-level safety note.
        unsafe { self.raw.unlock() }
    }

    /// `true` once `lock`/`try_lock` has succeeded at least once, matching
    /// the source implementation's "mutex never locked" check: a condvar
    /// wait against a mutex that has never been taken is a script-level
    /// error rather than a silent deadlock.
    pub(crate) fn ever_locked(&self) -> bool {
        self.ever_locked.load(Ordering::Relaxed)
    }

    /// Raw pointer identity, used by [`crate::sync::CondVar`] as a wait
    /// queue key so a wait is bucketed by the mutex it was given rather
    /// than by the condvar's own identity — the same association
    /// `parking_lot::Condvar` itself uses internally.
    pub(crate) fn queue_key(&self) -> usize {
        std::ptr::addr_of!(self.raw) as usize
    }
}
