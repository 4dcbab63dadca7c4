// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriptions: a pattern bound to a handler plus delivery options

use crate::error::InvalidDeliveryMode;
use crate::handler::Handler;
use crate::id::SubscriptionId;
use crate::pattern::EventPattern;
use crate::queue::EventQueue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How the bus hands an event to a subscription
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Handler awaited on the publisher's task, in priority order
    #[default]
    Sync,
    /// Handler spawned onto the runtime; publish does not wait
    Async,
    /// Event pushed onto the subscription's queue for a consumer to pull
    Queued,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Sync => "sync",
            DeliveryMode::Async => "async",
            DeliveryMode::Queued => "queued",
        }
    }

    pub fn is_synchronous(&self) -> bool {
        matches!(self, DeliveryMode::Sync)
    }
}

impl FromStr for DeliveryMode {
    type Err = InvalidDeliveryMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" => Ok(DeliveryMode::Sync),
            "async" => Ok(DeliveryMode::Async),
            "queued" => Ok(DeliveryMode::Queued),
            _ => Err(InvalidDeliveryMode(s.to_string())),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state; `Inactive` is terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    Active,
    Inactive,
}

/// Options accepted by `subscribe`
#[derive(Clone, Default)]
pub struct SubscribeOptions {
    pub(crate) priority: i32,
    pub(crate) delivery_mode: DeliveryMode,
    pub(crate) ttl: Option<Duration>,
    pub(crate) max_events: Option<u64>,
    pub(crate) queue_capacity: Option<usize>,
    pub(crate) queue: Option<Arc<dyn EventQueue>>,
}

impl SubscribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Higher priorities are dispatched first
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    /// Deactivate once this long has passed since subscribing
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Deactivate after this many deliveries
    pub fn max_events(mut self, max_events: u64) -> Self {
        self.max_events = Some(max_events);
        self
    }

    /// Capacity of the in-memory queue created for a queued subscription
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Use a caller-supplied queue instead of the default in-memory one
    pub fn queue(mut self, queue: Arc<dyn EventQueue>) -> Self {
        self.queue = Some(queue);
        self.delivery_mode = DeliveryMode::Queued;
        self
    }
}

impl fmt::Debug for SubscribeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("priority", &self.priority)
            .field("delivery_mode", &self.delivery_mode)
            .field("ttl", &self.ttl)
            .field("max_events", &self.max_events)
            .field("queue_capacity", &self.queue_capacity)
            .field("custom_queue", &self.queue.is_some())
            .finish()
    }
}

/// The immutable part of a subscription.
///
/// Delivery count and state live in the registry slot so this can be shared
/// as a snapshot without locking.
pub struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) pattern: Arc<EventPattern>,
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) priority: i32,
    pub(crate) delivery_mode: DeliveryMode,
    pub(crate) created_at: Instant,
    pub(crate) expires_at: Option<Instant>,
    pub(crate) max_events: Option<u64>,
    pub(crate) queue: Option<Arc<dyn EventQueue>>,
    /// Registration order, assigned by the registry
    pub(crate) seq: u64,
}

impl Subscription {
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn pattern(&self) -> &EventPattern {
        &self.pattern
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.delivery_mode
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn max_events(&self) -> Option<u64> {
        self.max_events
    }

    pub fn queue(&self) -> Option<&Arc<dyn EventQueue>> {
        self.queue.as_ref()
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pattern", &self.pattern.to_string())
            .field("priority", &self.priority)
            .field("delivery_mode", &self.delivery_mode)
            .field("max_events", &self.max_events)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Read-only view of a subscription for inspection
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub pattern: String,
    pub priority: i32,
    pub delivery_mode: DeliveryMode,
    pub state: SubscriptionState,
    pub delivered_count: u64,
    pub max_events: Option<u64>,
    #[serde(with = "humantime_serde")]
    pub ttl_remaining: Option<Duration>,
    pub queued_events: Option<usize>,
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
