//! Actor spawn configuration (spec §6 `create`, `configure` options).
//!
//! A `serde`-derived struct with a `validate()` method returning
//! descriptive `String` errors, in the shape the teacher's
//! `config::pool::PoolConfig` used for its own (now-dropped) domain.

use serde::{Deserialize, Serialize};

use crate::actor::lifecycle::ActorSpawnOptions;

/// Declarative form of [`ActorSpawnOptions`], suitable for loading from a
/// configuration file alongside [`super::pool::PoolConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Keep the actor's `JoinHandle` so it can later be joined.
    pub joinable: bool,
    /// Backpressure threshold for asynchronous sends (`-eventmark`).
    pub event_mark: Option<u64>,
    /// Whether a script error should additionally stop this actor
    /// (`-unwindonerror`).
    #[serde(default)]
    pub unwind_on_error: bool,
}

impl ActorConfig {
    /// Validate that the configured values make sense.
    ///
    /// # Errors
    ///
    /// Returns a description if `event_mark` is present but zero — a
    /// zero event-mark would block every asynchronous sender forever
    /// since no event could ever be processed to bring the pending count
    /// back down to the mark.
    pub fn validate(&self) -> Result<(), String> {
        if self.event_mark == Some(0) {
            return Err("event_mark of 0 would block every async sender forever".into());
        }
        Ok(())
    }

    /// Parse an `ActorConfig` from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` parse error if `json` is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize this config back to a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails (never
    /// expected for this struct's field types).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<ActorConfig> for ActorSpawnOptions {
    fn from(cfg: ActorConfig) -> Self {
        Self {
            joinable: cfg.joinable,
            event_mark: cfg.event_mark,
            unwind_on_error: cfg.unwind_on_error,
        }
    }
}
