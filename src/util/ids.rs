//! Monotonic id generators shared by the handle registry, actor registry,
//! send/reply engine and thread pools.
//!
//! Every counter here is process-wide and never reused after issuing a value,
//! matching the source system's "a deleted handle string never matches a
//! later registration" and "fresh monotonic job id" requirements.

use std::sync::atomic::{AtomicU64, Ordering};

/// A simple monotonic counter starting at zero.
#[derive(Debug, Default)]
pub struct IdCounter(AtomicU64);

impl IdCounter {
    /// Create a new counter starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Return the next value, never returning the same value twice.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let counter = IdCounter::new();
        let a = counter.next();
        let b = counter.next();
        let c = counter.next();
        assert_eq!([a, b, c], [0, 1, 2]);
    }
}
