// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-publish dispatch results

use crate::error::DispatchError;
use crate::id::{EventId, SubscriptionId};

/// Why a matched subscription was not delivered to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// TTL passed before this delivery
    Expired,
    /// `max_events` already reached
    Exhausted,
    /// Unsubscribed after the snapshot was taken
    Inactive,
}

/// What happened for one matched subscription
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sync handler ran and returned `Ok`
    Delivered,
    /// Async handler spawned; its result is reported through hooks and stats
    Scheduled,
    /// Event placed on the subscription's queue
    Enqueued,
    Failed(DispatchError),
    Skipped(SkipReason),
}

impl DispatchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DispatchOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DispatchOutcome::Skipped(_))
    }
}

/// Outcomes of one `publish`, in dispatch order
#[derive(Clone, Debug)]
pub struct PublishReport {
    event_id: EventId,
    outcomes: Vec<(SubscriptionId, DispatchOutcome)>,
}

impl PublishReport {
    pub(super) fn new(event_id: EventId, matched: usize) -> Self {
        Self {
            event_id,
            outcomes: Vec::with_capacity(matched),
        }
    }

    pub(super) fn record(&mut self, id: SubscriptionId, outcome: DispatchOutcome) {
        self.outcomes.push((id, outcome));
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Subscriptions whose pattern matched, including skipped ones
    pub fn matched(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcomes(&self) -> &[(SubscriptionId, DispatchOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, id: &SubscriptionId) -> Option<&DispatchOutcome> {
        self.outcomes
            .iter()
            .find(|(sub_id, _)| sub_id == id)
            .map(|(_, outcome)| outcome)
    }

    /// Subscriptions the event was handed to, in dispatch order
    pub fn dispatched(&self) -> Vec<&SubscriptionId> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.is_failure() && !o.is_skipped())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SubscriptionId, &DispatchError)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            DispatchOutcome::Failed(err) => Some((id, err)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| o.is_failure())
    }
}
