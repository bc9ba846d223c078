//! Recursive (reentrant) mutex (spec §4.B).
//!
//! Built from a non-reentrant `parking_lot::Mutex` guarding an owner/depth
//! pair plus a `parking_lot::Condvar`, rather than directly on `RawMutex`:
//! unlike [`crate::sync::ExclusiveMutex`], this type never needs to hand a
//! raw lock to an external condvar, so the RAII guard is no obstacle and
//! buys the usual `parking_lot::Condvar::wait` atomicity for free.

use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

struct State {
    owner: Option<ThreadId>,
    depth: u32,
}

/// A mutex that may be locked repeatedly by the thread already holding it.
pub struct RecursiveMutex {
    state: Mutex<State>,
    free: Condvar,
}

impl Default for RecursiveMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl RecursiveMutex {
    /// Create a new, unlocked mutex.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                owner: None,
                depth: 0,
            }),
            free: Condvar::new(),
        }
    }

    /// Acquire the lock. If the calling thread already holds it, its
    /// recursion depth is incremented instead of blocking.
    pub fn lock(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            match state.owner {
                None => {
                    state.owner = Some(me);
                    state.depth = 1;
                    return;
                }
                Some(owner) if owner == me => {
                    state.depth += 1;
                    return;
                }
                Some(_) => self.free.wait(&mut state),
            }
        }
    }

    /// Release one level of recursion. Once depth reaches zero the mutex
    /// becomes free and a single waiter is woken.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread does not currently hold the lock — a
    /// script-level misuse this type cannot recover from silently.
    pub fn unlock(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        assert_eq!(state.owner, Some(me), "unlock called by non-owning thread");
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            self.free.notify_one();
        }
    }

    /// Current recursion depth held by the calling thread, or zero.
    #[must_use]
    pub fn depth(&self) -> u32 {
        let me = thread::current().id();
        let state = self.state.lock();
        if state.owner == Some(me) {
            state.depth
        } else {
            0
        }
    }
}
