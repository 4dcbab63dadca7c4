// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus counters and the stats snapshot built from them

use crate::matcher::CacheStats;
use crate::subscription::DeliveryMode;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub(super) struct Counters {
    pub(super) published: AtomicU64,
    pub(super) dispatch_failures: AtomicU64,
    pub(super) successful_deliveries: AtomicU64,
    pub(super) sync_deliveries: AtomicU64,
    pub(super) async_deliveries: AtomicU64,
    pub(super) queued_deliveries: AtomicU64,
    pub(super) expired_subscriptions: AtomicU64,
}

impl Counters {
    pub(super) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(super) fn attempted(&self, mode: DeliveryMode) {
        Self::bump(match mode {
            DeliveryMode::Sync => &self.sync_deliveries,
            DeliveryMode::Async => &self.async_deliveries,
            DeliveryMode::Queued => &self.queued_deliveries,
        });
    }

    fn load(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of the bus.
///
/// Mode counters count deliveries handed out per mode; a failed handler or
/// rejected enqueue is still counted there and also in
/// `total_dispatch_failures`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BusStats {
    pub active_subscriptions: usize,
    /// Active plus inactive entries not yet purged
    pub total_subscriptions: usize,
    pub total_published: u64,
    pub total_dispatch_failures: u64,
    /// Handler invocations that returned `Ok`
    pub successful_deliveries: u64,
    pub sync_deliveries: u64,
    pub async_deliveries: u64,
    pub queued_deliveries: u64,
    pub expired_subscriptions: u64,
    /// Events waiting in the queues of active subscriptions
    pub queued_events: usize,
    pub matcher: &'static str,
    pub cache: Option<CacheStats>,
}

impl BusStats {
    pub(super) fn from_counters(counters: &Counters) -> Self {
        Self {
            active_subscriptions: 0,
            total_subscriptions: 0,
            total_published: Counters::load(&counters.published),
            total_dispatch_failures: Counters::load(&counters.dispatch_failures),
            successful_deliveries: Counters::load(&counters.successful_deliveries),
            sync_deliveries: Counters::load(&counters.sync_deliveries),
            async_deliveries: Counters::load(&counters.async_deliveries),
            queued_deliveries: Counters::load(&counters.queued_deliveries),
            expired_subscriptions: Counters::load(&counters.expired_subscriptions),
            queued_events: 0,
            matcher: "",
            cache: None,
        }
    }
}
