// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription registry
//!
//! The one piece of shared mutable state in the bus. Every mutation happens
//! under a single exclusive lock held only for the structural change;
//! dispatch works from snapshots of `Arc<Subscription>`.

use crate::id::SubscriptionId;
use crate::subscription::{Subscription, SubscriptionInfo, SubscriptionState};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Why a subscription stopped receiving events
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationReason {
    Unsubscribed,
    Expired,
    Exhausted,
    ShutDown,
}

/// Outcome of asking to deliver one event to a subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    /// Delivery may proceed; `last` when this used up `max_events`
    Granted { delivered: u64, last: bool },
    /// TTL passed; now inactive
    Expired,
    /// Budget already used; now inactive
    Exhausted,
    /// Unknown or already inactive
    Inactive,
}

/// Result of one sweep cycle
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Subscriptions flipped inactive because their TTL passed
    pub expired: Vec<Arc<Subscription>>,
    /// Entries removed after sitting inactive past the retention window
    pub purged: usize,
}

struct Slot {
    sub: Arc<Subscription>,
    state: SubscriptionState,
    delivered: u64,
    inactive_since: Option<Instant>,
    reason: Option<DeactivationReason>,
}

impl Slot {
    fn deactivate(&mut self, reason: DeactivationReason, now: Instant) {
        self.state = SubscriptionState::Inactive;
        self.inactive_since = Some(now);
        self.reason = Some(reason);
    }

    fn is_active(&self) -> bool {
        self.state == SubscriptionState::Active
    }
}

#[derive(Default)]
struct Slots {
    by_id: HashMap<SubscriptionId, Slot>,
    next_seq: u64,
}

/// Arena of subscriptions keyed by id
#[derive(Default)]
pub struct Registry {
    slots: RwLock<Slots>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription, assigning its registration order.
    ///
    /// Returns `None` if the id is already present.
    pub fn insert(&self, mut sub: Subscription) -> Option<Arc<Subscription>> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        if slots.by_id.contains_key(&sub.id) {
            return None;
        }

        sub.seq = slots.next_seq;
        slots.next_seq += 1;

        let sub = Arc::new(sub);
        slots.by_id.insert(
            sub.id.clone(),
            Slot {
                sub: Arc::clone(&sub),
                state: SubscriptionState::Active,
                delivered: 0,
                inactive_since: None,
                reason: None,
            },
        );
        Some(sub)
    }

    /// Flip an active subscription inactive.
    ///
    /// `None` when the id is unknown or already inactive.
    pub fn deactivate(
        &self,
        id: &SubscriptionId,
        reason: DeactivationReason,
        now: Instant,
    ) -> Option<Arc<Subscription>> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let slot = slots.by_id.get_mut(id).filter(|s| s.is_active())?;
        slot.deactivate(reason, now);
        Some(Arc::clone(&slot.sub))
    }

    /// Deactivate everything still active
    pub fn deactivate_all(&self, reason: DeactivationReason, now: Instant) -> Vec<Arc<Subscription>> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots
            .by_id
            .values_mut()
            .filter(|s| s.is_active())
            .map(|slot| {
                slot.deactivate(reason, now);
                Arc::clone(&slot.sub)
            })
            .collect()
    }

    /// Active subscriptions at this instant
    pub fn snapshot(&self) -> Vec<Arc<Subscription>> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots
            .by_id
            .values()
            .filter(|s| s.is_active())
            .map(|s| Arc::clone(&s.sub))
            .collect()
    }

    /// Re-check state, TTL and budget, and count the delivery if allowed
    pub fn claim(&self, id: &SubscriptionId, now: Instant) -> Claim {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let Some(slot) = slots.by_id.get_mut(id).filter(|s| s.is_active()) else {
            return Claim::Inactive;
        };

        if slot.sub.is_expired_at(now) {
            slot.deactivate(DeactivationReason::Expired, now);
            return Claim::Expired;
        }

        let max_events = slot.sub.max_events;
        if max_events.is_some_and(|max| slot.delivered >= max) {
            slot.deactivate(DeactivationReason::Exhausted, now);
            return Claim::Exhausted;
        }

        slot.delivered += 1;
        let last = max_events.is_some_and(|max| slot.delivered >= max);
        if last {
            slot.deactivate(DeactivationReason::Exhausted, now);
        }
        Claim::Granted {
            delivered: slot.delivered,
            last,
        }
    }

    /// Undo a granted claim whose event never reached the subscriber.
    ///
    /// Reactivates the subscription when that claim was the one that used up
    /// its budget. Returns `false` if there was nothing to release.
    pub fn release(&self, id: &SubscriptionId) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let Some(slot) = slots.by_id.get_mut(id) else {
            return false;
        };
        if slot.delivered == 0 {
            return false;
        }

        slot.delivered -= 1;
        let exhausted_by_claim = slot.reason == Some(DeactivationReason::Exhausted)
            && slot.sub.max_events.is_some_and(|max| slot.delivered < max);
        if exhausted_by_claim {
            slot.state = SubscriptionState::Active;
            slot.inactive_since = None;
            slot.reason = None;
        }
        true
    }

    /// Expire subscriptions past their TTL and purge entries that have been
    /// inactive for longer than `retention`.
    pub fn sweep(&self, now: Instant, retention: Duration) -> SweepOutcome {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let mut outcome = SweepOutcome::default();

        for slot in slots.by_id.values_mut() {
            if slot.is_active() && slot.sub.is_expired_at(now) {
                slot.deactivate(DeactivationReason::Expired, now);
                outcome.expired.push(Arc::clone(&slot.sub));
            }
        }

        let before = slots.by_id.len();
        slots.by_id.retain(|_, slot| match slot.inactive_since {
            Some(since) => now.duration_since(since) < retention,
            None => true,
        });
        outcome.purged = before - slots.by_id.len();

        outcome
    }

    pub fn get(&self, id: &SubscriptionId) -> Option<Arc<Subscription>> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.by_id.get(id).map(|s| Arc::clone(&s.sub))
    }

    pub fn state(&self, id: &SubscriptionId) -> Option<SubscriptionState> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.by_id.get(id).map(|s| s.state)
    }

    pub fn deactivation_reason(&self, id: &SubscriptionId) -> Option<DeactivationReason> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.by_id.get(id).and_then(|s| s.reason)
    }

    pub fn info(&self, id: &SubscriptionId, now: Instant) -> Option<SubscriptionInfo> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.by_id.get(id).map(|s| slot_info(s, now))
    }

    /// All entries, in registration order
    pub fn infos(&self, now: Instant) -> Vec<SubscriptionInfo> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<&Slot> = slots.by_id.values().collect();
        entries.sort_by_key(|s| s.sub.seq);
        entries.into_iter().map(|s| slot_info(s, now)).collect()
    }

    pub fn active_count(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.by_id.values().filter(|s| s.is_active()).count()
    }

    /// Entries held, active or not
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(|e| e.into_inner()).by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn slot_info(slot: &Slot, now: Instant) -> SubscriptionInfo {
    let sub = &slot.sub;
    SubscriptionInfo {
        id: sub.id.clone(),
        pattern: sub.pattern.to_string(),
        priority: sub.priority,
        delivery_mode: sub.delivery_mode,
        state: slot.state,
        delivered_count: slot.delivered,
        max_events: sub.max_events,
        ttl_remaining: sub.expires_at.map(|at| at.saturating_duration_since(now)),
        queued_events: sub.queue.as_ref().map(|q| q.size()),
    }
}

/// Sort into dispatch order: priority descending, then registration order
pub fn dispatch_order(subs: &mut [Arc<Subscription>]) {
    subs.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
