//! Reader/writer mutex (spec §4.B).
//!
//! A non-reentrant mutex guards a signed active-holder counter plus two
//! waiting-counts; two condvars separate the reader and writer wait sets so
//! a writer release only has to wake the set it intends to favor. Readers
//! back off while a writer holds the lock *or* one is waiting, giving
//! writers priority over a steady stream of readers.

use parking_lot::{Condvar, Mutex};

struct State {
    /// Positive: number of readers holding the lock. Negative (`-1`): a
    /// writer holds it. Zero: free.
    active: i64,
    waiting_writers: u32,
}

/// A lock with many-reader/one-writer semantics and writer preference.
pub struct RwMutex {
    state: Mutex<State>,
    readers: Condvar,
    writers: Condvar,
}

impl Default for RwMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl RwMutex {
    /// Create a new, unlocked lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                active: 0,
                waiting_writers: 0,
            }),
            readers: Condvar::new(),
            writers: Condvar::new(),
        }
    }

    /// Acquire a read lock, blocking while a writer holds or is waiting for
    /// the lock.
    pub fn read_lock(&self) {
        let mut state = self.state.lock();
        while state.active < 0 || state.waiting_writers > 0 {
            self.readers.wait(&mut state);
        }
        state.active += 1;
    }

    /// Acquire the write lock, blocking while any reader or writer holds it.
    pub fn write_lock(&self) {
        let mut state = self.state.lock();
        state.waiting_writers += 1;
        while state.active != 0 {
            self.writers.wait(&mut state);
        }
        state.waiting_writers -= 1;
        state.active = -1;
    }

    /// Release a lock held by the calling thread, whichever kind it is.
    ///
    /// # Panics
    ///
    /// Panics if the lock is not currently held.
    pub fn unlock(&self) {
        let mut state = self.state.lock();
        assert_ne!(state.active, 0, "unlock called on a free rwmutex");
        if state.active > 0 {
            state.active -= 1;
        } else {
            state.active = 0;
        }
        if state.active == 0 {
            if state.waiting_writers > 0 {
                self.writers.notify_one();
            } else {
                self.readers.notify_all();
            }
        }
    }
}
