//! Kernel configuration.
//!
//! Defaults match the editor's behavior; every knob can be overridden from
//! the environment:
//!
//! - `STORY_MAX_SNAPSHOTS`: snapshot log bound (default: 25)
//! - `STORY_AUTOSAVE_INTERVAL_MS`: autosave tick period (default: 5000)
//! - `STORY_FIRST_TICK_DELAY_MS`: delay before the first forced tick (default: 1000)

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::CanvasBounds;

/// Default maximum number of snapshots kept in the log.
pub const DEFAULT_MAX_SNAPSHOTS: usize = 25;

/// Default autosave interval.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

/// Default delay before the first forced autosave tick.
pub const DEFAULT_FIRST_TICK_DELAY: Duration = Duration::from_secs(1);

/// Error raised by invalid configuration overrides.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
    /// A value parsed but is out of range.
    #[error("{var} must be greater than zero")]
    Zero {
        /// Variable name.
        var: &'static str,
    },
}

/// Logical storage keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    /// Serialized snapshot log.
    pub snapshots: String,
    /// Timestamp of the last snapshot commit.
    pub last_saved: String,
    /// The live graph, owned by the editor.
    pub graph: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            snapshots: "snapshots".to_string(),
            last_saved: "lastSaved".to_string(),
            graph: "story_data".to_string(),
        }
    }
}

/// Configuration for the editor, snapshot log, and autosave loop.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelConfig {
    /// Maximum snapshots kept; oldest are evicted first.
    pub max_snapshots: usize,
    /// Period between autosave ticks.
    pub autosave_interval: Duration,
    /// Delay before the first tick after the loop starts.
    pub first_tick_delay: Duration,
    /// Canvas region scene positions are clamped into.
    pub canvas: CanvasBounds,
    /// Storage key names.
    pub keys: StorageKeys,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_snapshots: DEFAULT_MAX_SNAPSHOTS,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            first_tick_delay: DEFAULT_FIRST_TICK_DELAY,
            canvas: CanvasBounds::default(),
            keys: StorageKeys::default(),
        }
    }
}

impl KernelConfig {
    /// Defaults overridden by `STORY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`KernelConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(n) = parse_positive(&lookup, "STORY_MAX_SNAPSHOTS")? {
            config.max_snapshots = n as usize;
        }
        if let Some(ms) = parse_positive(&lookup, "STORY_AUTOSAVE_INTERVAL_MS")? {
            config.autosave_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_positive(&lookup, "STORY_FIRST_TICK_DELAY_MS")? {
            config.first_tick_delay = Duration::from_millis(ms);
        }
        Ok(config)
    }

    /// Builder-style override of the snapshot bound.
    pub fn with_max_snapshots(mut self, max: usize) -> Self {
        self.max_snapshots = max.max(1);
        self
    }
}

fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let value: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.clone(),
    })?;
    if value == 0 {
        return Err(ConfigError::Zero { var });
    }
    Ok(Some(value))
}
