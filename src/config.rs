//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::CountMode;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Lifetime of items inserted without an explicit one; zero = never expire
    pub default_expiration: Duration,
    /// Interval between background sweep passes; zero = no sweeper
    pub sweep_interval: Duration,
    /// Whether overwrites grow the item count
    pub count_mode: CountMode,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_EXPIRATION` - Default lifetime in seconds, <= 0 never expires (default: 300)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds, <= 0 disables sweeping (default: 1)
    /// - `COUNT_OVERWRITES` - Count every insert, overwrites included (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_expiration: env::var("DEFAULT_EXPIRATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(non_negative_secs)
                .unwrap_or(defaults.default_expiration),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(non_negative_secs)
                .unwrap_or(defaults.sweep_interval),
            count_mode: env::var("COUNT_OVERWRITES")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .map(|every| {
                    if every {
                        CountMode::EveryInsert
                    } else {
                        CountMode::UniqueKeys
                    }
                })
                .unwrap_or(defaults.count_mode),
        }
    }
}

/// Clamps signed seconds to a duration, mapping non-positive values to zero.
fn non_negative_secs(secs: i64) -> Duration {
    Duration::from_secs(secs.max(0).unsigned_abs())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_expiration: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(1),
            count_mode: CountMode::UniqueKeys,
        }
    }
}
