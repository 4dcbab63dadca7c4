// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic subscription sweep
//!
//! Expires subscriptions whose TTL has passed even when no event arrives to
//! trigger lazy expiry, and drops entries that have stayed inactive past the
//! retention window.

use crate::clock::Clock;
use crate::registry::Registry;
use std::time::Duration;

/// Configuration for the sweep task
#[derive(Clone, Debug)]
pub struct SweepConfig {
    /// How often to run a sweep
    pub interval: Duration,
    /// How long an inactive entry stays inspectable before it is purged
    pub retention: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            retention: Duration::from_secs(300),
        }
    }
}

impl SweepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

/// Counts from one sweep cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub expired: usize,
    pub purged: usize,
}

/// Runs sweep cycles against a registry
pub struct SweepTask<C: Clock> {
    config: SweepConfig,
    clock: C,
}

impl<C: Clock> SweepTask<C> {
    pub fn new(config: SweepConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// Run a single sweep cycle
    pub fn tick(&self, registry: &Registry) -> SweepStats {
        let outcome = registry.sweep(self.clock.now(), self.config.retention);

        for sub in &outcome.expired {
            // Queued consumers should stop waiting on an expired subscription
            if let Some(queue) = sub.queue() {
                queue.close();
            }
            tracing::debug!(subscription_id = %sub.id(), "subscription expired");
        }

        let stats = SweepStats {
            expired: outcome.expired.len(),
            purged: outcome.purged,
        };
        if stats.expired > 0 || stats.purged > 0 {
            tracing::info!(
                expired = stats.expired,
                purged = stats.purged,
                "subscription sweep"
            );
        }
        stats
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
