// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus configuration
//!
//! Loaded from TOML. Every key is optional and falls back to its default:
//!
//! ```toml
//! matcher = "cached"
//! cache_capacity = 1000
//! queue_capacity = 1024
//! max_concurrent_deliveries = 10
//! sweep_interval = "30s"
//! inactive_retention = "5m"
//! shutdown_timeout = "5s"
//! delivery_confirmations = false
//! ```

use crate::error::ConfigError;
use crate::matcher::MatcherKind;
use crate::sweep::SweepConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    /// Pattern matcher used by publish
    pub matcher: MatcherKind,
    /// Type decisions held by the cached matcher
    pub cache_capacity: usize,
    /// Default capacity of queues created for queued subscriptions
    pub queue_capacity: usize,
    /// Async handlers allowed to run at once
    pub max_concurrent_deliveries: usize,
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// How long inactive subscriptions remain inspectable
    #[serde(with = "humantime_serde")]
    pub inactive_retention: Duration,
    /// Upper bound on waiting for in-flight async deliveries at shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    /// Publish a `system.delivery.confirmation` event for each delivery
    pub delivery_confirmations: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherKind::Cached,
            cache_capacity: 1000,
            queue_capacity: 1024,
            max_concurrent_deliveries: 10,
            sweep_interval: Duration::from_secs(30),
            inactive_retention: Duration::from_secs(300),
            shutdown_timeout: Duration::from_secs(5),
            delivery_confirmations: false,
        }
    }
}

impl BusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BusConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&content)
    }

    /// Reject values the bus cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_deliveries == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_deliveries",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "sweep_interval",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_matcher(mut self, matcher: MatcherKind) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_max_concurrent_deliveries(mut self, limit: usize) -> Self {
        self.max_concurrent_deliveries = limit;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_inactive_retention(mut self, retention: Duration) -> Self {
        self.inactive_retention = retention;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_delivery_confirmations(mut self, enabled: bool) -> Self {
        self.delivery_confirmations = enabled;
        self
    }

    pub fn sweep(&self) -> SweepConfig {
        SweepConfig::new()
            .with_interval(self.sweep_interval)
            .with_retention(self.inactive_retention)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
