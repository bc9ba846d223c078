//! `eval -lock mutexHandle body` helper (spec §4.B / §6).
//!
//! Locks the given mutex, runs `body`, and unlocks unconditionally
//! afterward — whether `body` returned an error or not — so a failing
//! script never leaves the mutex held.

use super::ExclusiveMutex;

/// Run `body` while holding `mutex`, guaranteeing it is unlocked afterward
/// regardless of what `body` returns.
pub fn locked_eval<T>(mutex: &ExclusiveMutex, body: impl FnOnce() -> T) -> T {
    mutex.lock();
    let result = body();
    mutex.unlock();
    result
}
