//! Configuration types

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-query cache policy.
///
/// Durations are written as whole milliseconds in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// How long after a successful fetch data is served without refreshing.
    #[serde(rename = "stale_window_ms", with = "duration_ms")]
    pub stale_window: Duration,
    /// How long an unobserved entry may sit unused before it is evicted.
    #[serde(rename = "gc_window_ms", with = "duration_ms")]
    pub gc_window: Duration,
    /// When false, reads perform no fetch and leave the cache untouched.
    pub enabled: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_window: Duration::from_secs(5 * 60),
            gc_window: Duration::from_secs(10 * 60),
            enabled: true,
        }
    }
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_window(mut self, duration: Duration) -> Self {
        self.stale_window = duration;
        self
    }

    pub fn with_gc_window(mut self, duration: Duration) -> Self {
        self.gc_window = duration;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// An entry must not become collectable while its data is still fresh.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gc_window < self.stale_window {
            return Err(ConfigError::InvalidValue {
                field: "gc_window_ms".to_string(),
                value: self.gc_window.as_millis().to_string(),
                reason: "gc_window_ms must be >= stale_window_ms".to_string(),
            });
        }
        Ok(())
    }
}

/// Delay policy for re-attempting a failed background refresh.
///
/// Only consulted while stale data is being served. A query with no cached
/// data always fetches on the next enabled read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 1_000,
            max_ms: 60_000,
            multiplier: 2.0,
        }
    }
}

impl BackoffConfig {
    /// Delay to wait after `failures` consecutive failed refreshes.
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(failures - 1).unwrap_or(i32::MAX);
        let scaled = self.initial_ms as f64 * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_ms as f64);
        Duration::from_millis(capped as u64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "initial_ms".to_string(),
                value: self.initial_ms.to_string(),
                reason: "initial_ms must be > 0".to_string(),
            });
        }
        if self.max_ms < self.initial_ms {
            return Err(ConfigError::InvalidValue {
                field: "max_ms".to_string(),
                value: self.max_ms.to_string(),
                reason: "max_ms must be >= initial_ms".to_string(),
            });
        }
        if !(self.multiplier >= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "multiplier".to_string(),
                value: self.multiplier.to_string(),
                reason: "multiplier must be >= 1.0".to_string(),
            });
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
