//! Synchronization primitives exposed through the handle registry
//! (component B / spec §4.B): exclusive and recursive mutexes, a
//! writer-preferring reader/writer lock, and a condition variable that
//! pairs with an exclusive mutex handle.

pub mod condvar;
pub mod eval;
pub mod exclusive;
pub mod recursive;
pub mod rwlock;

pub use condvar::CondVar;
pub use eval::locked_eval;
pub use exclusive::ExclusiveMutex;
pub use recursive::RecursiveMutex;
pub use rwlock::RwMutex;
