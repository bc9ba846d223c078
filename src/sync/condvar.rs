//! Condition variable paired with an already-locked exclusive mutex
//! (spec §4.B).
//!
//! `cond wait` and `mutex lock`/`unlock` are independent script commands, so
//! this can't be built on `parking_lot::Condvar` the ordinary way — that API
//! wants a `MutexGuard` to prove the mutex is held and to unlock/relock it
//! atomically around the wait. Instead this wraps `parking_lot_core`'s
//! `park`/`unpark_all` directly, exactly the low-level building block
//! `parking_lot::Condvar` itself is implemented on top of, and uses the
//! target mutex's own address as the wait queue key so a wait is bucketed
//! with that specific mutex rather than with this condvar's identity.

use std::time::{Duration, Instant};

use parking_lot_core::{self, ParkResult, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

use super::ExclusiveMutex;
use crate::error::ThreadError;

/// A condition variable that waits against a caller-supplied exclusive
/// mutex rather than owning one itself.
#[derive(Default)]
pub struct CondVar {
    _private: (),
}

impl CondVar {
    /// Create a new condition variable.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Release `mutex`, wait to be notified (or until `timeout_ms`
    /// elapses), then reacquire `mutex` before returning.
    ///
    /// `mutex_handle` is used only for the error message if `mutex` has
    /// never been locked.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::MutexNeverLocked`] if `mutex` has never had a
    /// successful `lock`/`try_lock` — mirroring the source command's check
    /// that the mutex's underlying lock has actually been allocated before
    /// a wait can be paired with it.
    pub fn wait(
        &self,
        mutex: &ExclusiveMutex,
        mutex_handle: &str,
        timeout_ms: Option<u64>,
    ) -> Result<(), ThreadError> {
        if !mutex.ever_locked() {
            return Err(ThreadError::MutexNeverLocked(mutex_handle.to_string()));
        }

        let key = mutex.queue_key();
        let deadline = timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms));

        // SAFETY: `key` is the address of `mutex`'s internal `RawMutex`,
        // which outlives this call because `mutex` is borrowed for the
        // duration; `before_sleep` unlocks it exactly once, matching the
        // lock the caller is required to already hold, and the lock is
        // reacquired unconditionally once parking returns.
        let result = unsafe {
            parking_lot_core::park(
                key,
                || true,
                || mutex.unlock(),
                |_, _| {},
                DEFAULT_PARK_TOKEN,
                deadline,
            )
        };
        mutex.lock();
        match result {
            ParkResult::Unparked(_) | ParkResult::Invalid => Ok(()),
            ParkResult::TimedOut => Err(ThreadError::Timeout),
        }
    }

    /// Wake one thread waiting on `mutex`, if any.
    pub fn notify(&self, mutex: &ExclusiveMutex) {
        let key = mutex.queue_key();
        parking_lot_core::unpark_all(key, DEFAULT_UNPARK_TOKEN);
    }
}
