//! Thread pool configuration (spec §6 `tpool create` options), matching
//! the shape of the teacher's original `config::pool::PoolConfig`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pool::PoolOptions;

/// Declarative form of [`PoolOptions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Workers kept alive even while idle.
    pub min_workers: usize,
    /// Upper bound on concurrently live workers.
    pub max_workers: usize,
    /// Idle-retirement timeout in seconds; `0` means never retire.
    pub idle_timeout_secs: u64,
    /// A script every worker evaluates once on startup.
    pub init_script: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_workers: 0,
            max_workers: 4,
            idle_timeout_secs: 0,
            init_script: None,
        }
    }
}

impl PoolConfig {
    /// Validate that the configured values describe a constructible pool.
    ///
    /// # Errors
    ///
    /// Returns a description if `max_workers` is zero or below
    /// `min_workers`.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 {
            return Err("max_workers must be greater than 0".into());
        }
        if self.min_workers > self.max_workers {
            return Err("min_workers must not exceed max_workers".into());
        }
        Ok(())
    }

    /// Parse a `PoolConfig` from a JSON document.
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

impl From<PoolConfig> for PoolOptions {
    fn from(cfg: PoolConfig) -> Self {
        Self {
            min_workers: cfg.min_workers,
            max_workers: cfg.max_workers,
            idle_timeout: (cfg.idle_timeout_secs > 0).then(|| Duration::from_secs(cfg.idle_timeout_secs)),
            init_script: cfg.init_script,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_max_workers_is_invalid() {
        let cfg = PoolConfig {
            max_workers: 0,
            ..PoolConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn min_above_max_is_invalid() {
        let cfg = PoolConfig {
            min_workers: 5,
            max_workers: 2,
            ..PoolConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_idle_timeout_means_never_retire() {
        let cfg = PoolConfig::default();
        let opts: PoolOptions = cfg.into();
        assert!(opts.idle_timeout.is_none());
    }

    #[test]
    fn positive_idle_timeout_converts() {
        let cfg = PoolConfig {
            idle_timeout_secs: 30,
            ..PoolConfig::default()
        };
        let opts: PoolOptions = cfg.into();
        assert_eq!(opts.idle_timeout, Some(std::time::Duration::from_secs(30)));
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = PoolConfig {
            min_workers: 2,
            max_workers: 8,
            idle_timeout_secs: 15,
            init_script: Some("expr {0+0}".into()),
        };
        let json = cfg.to_json().unwrap();
        let parsed = PoolConfig::from_json(&json).unwrap();
        assert_eq!(parsed.min_workers, cfg.min_workers);
        assert_eq!(parsed.max_workers, cfg.max_workers);
        assert_eq!(parsed.idle_timeout_secs, cfg.idle_timeout_secs);
        assert_eq!(parsed.init_script, cfg.init_script);
    }
}
