//! Channel ownership table backing `thread::transfer` (spec §4.E).
//!
//! The scripting language's channel objects are themselves out of scope
//! (spec §1); what this crate tracks is only *which actor currently owns*
//! a named channel, which is the part `transfer` actually needs to
//! arbitrate.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::actor::registry::ActorId;
use crate::error::ThreadError;

#[derive(Default)]
struct State {
    owned: HashMap<ActorId, HashSet<String>>,
    shared: HashSet<String>,
}

/// Tracks, per actor, which channel names it currently owns.
#[derive(Default)]
pub struct ChannelRegistry {
    state: Mutex<State>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly created channel as owned by `owner`.
    pub fn register(&self, owner: ActorId, name: &str) {
        self.state.lock().owned.entry(owner).or_default().insert(name.to_string());
    }

    /// Mark `name` as shared, making it ineligible for `transfer`.
    pub fn mark_shared(&self, name: &str) {
        self.state.lock().shared.insert(name.to_string());
    }

    /// Move ownership of `name` from `origin` to `target`.
    ///
    /// # Errors
    ///
    /// - [`ThreadError::ChannelNotRegistered`] if `origin` does not own a
    ///   channel by that name.
    /// - [`ThreadError::ChannelShared`] if the channel is marked shared.
    /// - [`ThreadError::ChannelExists`] if `target` already owns a
    ///   same-named channel (origin keeps ownership on this failure).
    pub fn transfer(&self, name: &str, origin: ActorId, target: ActorId) -> Result<(), ThreadError> {
        let mut state = self.state.lock();
        if state.shared.contains(name) {
            return Err(ThreadError::ChannelShared(name.to_string()));
        }
        let had_it = state.owned.get_mut(&origin).is_some_and(|set| set.remove(name));
        if !had_it {
            return Err(ThreadError::ChannelNotRegistered(name.to_string()));
        }
        let target_set = state.owned.entry(target).or_default();
        if target_set.contains(name) {
            state.owned.entry(origin).or_default().insert(name.to_string());
            return Err(ThreadError::ChannelExists(name.to_string()));
        }
        target_set.insert(name.to_string());
        Ok(())
    }

    /// Reclaim every channel owned by a dead actor back to whichever side
    /// still exists — here, simply dropped, since no peer is left to
    /// hand them to once an actor with no pending transfer has exited.
    pub fn drop_owner(&self, owner: ActorId) {
        self.state.lock().owned.remove(&owner);
    }
}
