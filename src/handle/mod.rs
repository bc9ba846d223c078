//! Process-wide handle registry (component A).
//!
//! Maps opaque script-facing handle strings of the form `<tag>id<counter>`
//! to sync-primitive objects. The registry lock is held only across the map
//! access, never across user work on the resolved object, matching spec
//! §4.A's resolution contract.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ThreadError;
use crate::sync::{CondVar, ExclusiveMutex, RecursiveMutex, RwMutex};
use crate::util::IdCounter;

/// The single-character tag encoding a handle's primitive kind, per spec §3
/// ("Sync-handle table") and §4.A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleTag {
    /// Exclusive (non-reentrant) mutex — tag `m`.
    Exclusive,
    /// Recursive mutex — tag `r`.
    Recursive,
    /// Reader/writer mutex — tag `w`.
    ReaderWriter,
    /// Condition variable — tag `c`.
    Condvar,
}

impl HandleTag {
    fn as_char(self) -> char {
        match self {
            Self::Exclusive => 'm',
            Self::Recursive => 'r',
            Self::ReaderWriter => 'w',
            Self::Condvar => 'c',
        }
    }
}

/// A registered synchronization object, tagged by kind.
///
/// A tagged-variant enum is used in place of a `dyn Any` registry, per the
/// design note preferring "a tagged-variant type over string prefix
/// parsing": dispatch on `SyncObject` is a `match`, not a `str` scan of the
/// handle.
#[derive(Clone)]
pub enum SyncObject {
    /// An exclusive mutex.
    Exclusive(Arc<ExclusiveMutex>),
    /// A recursive mutex.
    Recursive(Arc<RecursiveMutex>),
    /// A reader/writer mutex.
    ReaderWriter(Arc<RwMutex>),
    /// A condition variable.
    Condvar(Arc<CondVar>),
}

impl SyncObject {
    fn tag(&self) -> HandleTag {
        match self {
            Self::Exclusive(_) => HandleTag::Exclusive,
            Self::Recursive(_) => HandleTag::Recursive,
            Self::ReaderWriter(_) => HandleTag::ReaderWriter,
            Self::Condvar(_) => HandleTag::Condvar,
        }
    }
}

/// The process-wide sync-handle table (spec §4.A).
#[derive(Default)]
pub struct HandleRegistry {
    objects: Mutex<HashMap<String, SyncObject>>,
    counter: IdCounter,
}

impl HandleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `object` and return its new, never-reused handle string.
    pub fn register(&self, object: SyncObject) -> String {
        let tag = object.tag().as_char();
        let id = self.counter.next();
        let handle = format!("{tag}id{id}");
        self.objects.lock().insert(handle.clone(), object);
        handle
    }

    /// Resolve `handle` to its registered object.
    pub fn resolve(&self, handle: &str) -> Result<SyncObject, ThreadError> {
        self.objects
            .lock()
            .get(handle)
            .cloned()
            .ok_or_else(|| ThreadError::NoSuchHandle(handle.to_string()))
    }

    /// Remove `handle` from the registry. Idempotent: removing an unknown
    /// handle is not an error.
    pub fn unregister(&self, handle: &str) {
        self.objects.lock().remove(handle);
    }

    /// Resolve `handle` expecting an exclusive mutex.
    pub fn resolve_exclusive(&self, handle: &str) -> Result<Arc<ExclusiveMutex>, ThreadError> {
        match self.resolve(handle)? {
            SyncObject::Exclusive(m) => Ok(m),
            _ => Err(ThreadError::WrongMutexType(handle.to_string())),
        }
    }

    /// Resolve `handle` expecting a recursive mutex.
    pub fn resolve_recursive(&self, handle: &str) -> Result<Arc<RecursiveMutex>, ThreadError> {
        match self.resolve(handle)? {
            SyncObject::Recursive(m) => Ok(m),
            _ => Err(ThreadError::WrongMutexType(handle.to_string())),
        }
    }

    /// Resolve `handle` expecting a reader/writer mutex.
    pub fn resolve_rwlock(&self, handle: &str) -> Result<Arc<RwMutex>, ThreadError> {
        match self.resolve(handle)? {
            SyncObject::ReaderWriter(m) => Ok(m),
            _ => Err(ThreadError::WrongMutexType(handle.to_string())),
        }
    }

    /// Resolve `handle` expecting a condition variable.
    pub fn resolve_condvar(&self, handle: &str) -> Result<Arc<CondVar>, ThreadError> {
        match self.resolve(handle)? {
            SyncObject::Condvar(c) => Ok(c),
            _ => Err(ThreadError::WrongMutexType(handle.to_string())),
        }
    }
}
