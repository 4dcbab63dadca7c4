// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus for routing events to subscribers
//!
//! `EventBus` is an ordinary value with its own lifecycle; clones share the
//! same registry, counters and queues. Publish matches against a snapshot of
//! active subscriptions, so handlers may subscribe or unsubscribe freely.

mod dispatch;
mod hooks;
mod report;
mod stats;

pub use hooks::{DispatchFailure, HookId};
pub use report::{DispatchOutcome, PublishReport, SkipReason};
pub use stats::BusStats;

use crate::clock::{Clock, SystemClock};
use crate::config::BusConfig;
use crate::error::{BusError, DequeueError, SubscribeError};
use crate::event::Event;
use crate::handler::Handler;
use crate::id::{IdGen, SubscriptionId, UuidIdGen};
use crate::matcher::PatternMatcher;
use crate::pattern::IntoPattern;
use crate::queue::{EventQueue, InMemoryEventQueue};
use crate::registry::{DeactivationReason, Registry};
use crate::subscription::{DeliveryMode, SubscribeOptions, Subscription, SubscriptionInfo};
use crate::sweep::{SweepStats, SweepTask};
use hooks::ErrorHooks;
use stats::Counters;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;

/// Event type of the confirmations published when enabled in config
pub const CONFIRMATION_EVENT_TYPE: &str = "system.delivery.confirmation";

/// Source label on events the bus publishes itself
pub const ROUTER_SOURCE: &str = "event_router";

/// The event bus routes events to matching subscriptions
pub struct EventBus<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    inner: Arc<Inner<C, I>>,
}

struct Inner<C, I> {
    config: BusConfig,
    clock: C,
    id_gen: I,
    registry: Registry,
    matcher: Arc<dyn PatternMatcher>,
    counters: Counters,
    hooks: ErrorHooks,
    /// Bounds async handlers running at once
    deliveries: Arc<Semaphore>,
    in_flight: AtomicUsize,
    idle: Notify,
    shut_down: AtomicBool,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl EventBus<SystemClock, UuidIdGen> {
    pub fn new(config: BusConfig) -> Self {
        Self::with_deps(config, SystemClock, UuidIdGen)
    }
}

impl Default for EventBus<SystemClock, UuidIdGen> {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl<C: Clock, I: IdGen> EventBus<C, I> {
    /// Build a bus with an explicit clock and id generator
    pub fn with_deps(config: BusConfig, clock: C, id_gen: I) -> Self {
        let matcher = config.matcher.build(config.cache_capacity);
        Self::with_matcher(config, clock, id_gen, matcher)
    }

    /// Build a bus around a caller-supplied matcher, ignoring `config.matcher`
    pub fn with_matcher(
        config: BusConfig,
        clock: C,
        id_gen: I,
        matcher: Arc<dyn PatternMatcher>,
    ) -> Self {
        let permits = config.max_concurrent_deliveries.max(1);
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                id_gen,
                registry: Registry::new(),
                matcher,
                counters: Counters::default(),
                hooks: ErrorHooks::default(),
                deliveries: Arc::new(Semaphore::new(permits)),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                shut_down: AtomicBool::new(false),
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// Register a handler for events matching `pattern`.
    ///
    /// A malformed pattern is rejected here and no subscription is created.
    pub fn subscribe(
        &self,
        pattern: impl IntoPattern,
        handler: impl Handler,
        options: SubscribeOptions,
    ) -> Result<SubscriptionId, SubscribeError> {
        let inner = &self.inner;
        if inner.is_shut_down() {
            return Err(BusError::ShutDown.into());
        }

        let pattern = pattern.into_pattern()?;
        let id = SubscriptionId(inner.id_gen.next());

        let queue = match options.delivery_mode {
            DeliveryMode::Queued => Some(options.queue.unwrap_or_else(|| {
                let capacity = options.queue_capacity.unwrap_or(inner.config.queue_capacity);
                Arc::new(InMemoryEventQueue::new(capacity)) as Arc<dyn EventQueue>
            })),
            DeliveryMode::Sync | DeliveryMode::Async => None,
        };

        let subscription = Subscription {
            id: id.clone(),
            pattern: Arc::new(pattern),
            handler: Arc::new(handler),
            priority: options.priority,
            delivery_mode: options.delivery_mode,
            created_at: inner.clock.now(),
            expires_at: options.ttl.map(|ttl| inner.clock.deadline(ttl)),
            max_events: options.max_events,
            queue,
            seq: 0,
        };

        let sub = inner
            .registry
            .insert(subscription)
            .ok_or_else(|| SubscribeError::DuplicateId(id.clone()))?;

        tracing::debug!(
            subscription_id = %id,
            pattern = %sub.pattern(),
            priority = sub.priority(),
            delivery_mode = %sub.delivery_mode(),
            "subscribed"
        );
        Ok(id)
    }

    /// Stop delivering to a subscription.
    ///
    /// Returns `false` if it was unknown or already inactive. A queued
    /// subscription's queue is closed so consumers drain and stop.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let now = self.inner.clock.now();
        match self
            .inner
            .registry
            .deactivate(id, DeactivationReason::Unsubscribed, now)
        {
            Some(sub) => {
                if let Some(queue) = sub.queue() {
                    queue.close();
                }
                tracing::debug!(subscription_id = %id, "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Route an event to every matching active subscription.
    ///
    /// Sync handlers have finished when this returns; async handlers have
    /// been spawned and queued events enqueued. Delivery failures are
    /// reported in the returned [`PublishReport`], never as an `Err`.
    pub async fn publish(&self, event: impl Into<Arc<Event>>) -> Result<PublishReport, BusError> {
        Arc::clone(&self.inner).route(event.into()).await
    }

    pub fn stats(&self) -> BusStats {
        let inner = &self.inner;
        let active = inner.registry.snapshot();
        BusStats {
            active_subscriptions: active.len(),
            total_subscriptions: inner.registry.len(),
            queued_events: active
                .iter()
                .filter_map(|sub| sub.queue())
                .map(|queue| queue.size())
                .sum(),
            matcher: inner.matcher.name(),
            cache: inner.matcher.cache_stats(),
            ..BusStats::from_counters(&inner.counters)
        }
    }

    pub fn subscription(&self, id: &SubscriptionId) -> Option<SubscriptionInfo> {
        self.inner.registry.info(id, self.inner.clock.now())
    }

    /// Every subscription still held, in registration order
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.inner.registry.infos(self.inner.clock.now())
    }

    /// The queue of a queued subscription, for pull consumers
    pub fn queue(&self, id: &SubscriptionId) -> Option<Arc<dyn EventQueue>> {
        self.inner.registry.get(id)?.queue().cloned()
    }

    /// Drain a queued subscription's queue into its handler.
    ///
    /// The worker waits up to `poll` per dequeue and exits once the queue is
    /// closed and empty. `None` if the subscription is unknown or not queued.
    pub fn spawn_queue_worker(&self, id: &SubscriptionId, poll: Duration) -> Option<JoinHandle<()>> {
        let sub = self.inner.registry.get(id)?;
        let queue = Arc::clone(sub.queue()?);
        let inner = Arc::clone(&self.inner);

        Some(tokio::spawn(async move {
            loop {
                match queue.dequeue(poll).await {
                    Ok(event) => {
                        let _ = inner.invoke(&sub, &event).await;
                    }
                    Err(DequeueError::Timeout) => continue,
                    Err(DequeueError::Closed) => break,
                }
            }
            tracing::debug!(subscription_id = %sub.id(), "queue worker stopped");
        }))
    }

    /// Register a hook called with every failed delivery
    pub fn on_dispatch_error<F>(&self, hook: F) -> HookId
    where
        F: Fn(&DispatchFailure) + Send + Sync + 'static,
    {
        self.inner.hooks.add(Arc::new(hook))
    }

    pub fn remove_error_hook(&self, id: HookId) -> bool {
        self.inner.hooks.remove(id)
    }

    /// Start the periodic sweep. Must be called from within a tokio runtime.
    ///
    /// Calling it again while running has no effect.
    pub fn start(&self) {
        let mut sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if sweeper.is_some() || self.inner.is_shut_down() {
            return;
        }

        let task = SweepTask::new(self.inner.config.sweep(), self.inner.clock.clone());
        let weak = Arc::downgrade(&self.inner);
        let period = task.interval();

        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.sweep(&task);
            }
        }));

        tracing::info!(interval_ms = period.as_millis() as u64, "event bus started");
    }

    /// Run one sweep cycle now
    pub fn sweep_now(&self) -> SweepStats {
        let task = SweepTask::new(self.inner.config.sweep(), self.inner.clock.clone());
        self.inner.sweep(&task)
    }

    /// Stop the sweeper, deactivate every subscription, close every queue and
    /// wait up to `shutdown_timeout` for in-flight async deliveries.
    ///
    /// Further publishes and subscribes fail with [`BusError::ShutDown`].
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        if inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let sweeper = inner
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = sweeper {
            handle.abort();
        }

        let stopped = inner
            .registry
            .deactivate_all(DeactivationReason::ShutDown, inner.clock.now());
        for sub in &stopped {
            if let Some(queue) = sub.queue() {
                queue.close();
            }
        }

        let drained = inner.wait_idle(inner.config.shutdown_timeout).await;
        if !drained {
            tracing::warn!(
                in_flight = inner.in_flight.load(Ordering::SeqCst),
                "shutdown timed out waiting for async deliveries"
            );
        }
        tracing::info!(subscriptions = stopped.len(), "event bus shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.is_shut_down()
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    pub fn clock(&self) -> &C {
        &self.inner.clock
    }
}

impl<C: Clock, I: IdGen> Clone for EventBus<C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock, I: IdGen> Inner<C, I> {
    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn sweep(&self, task: &SweepTask<C>) -> SweepStats {
        let stats = task.tick(&self.registry);
        Counters::add(&self.counters.expired_subscriptions, stats.expired);
        stats
    }

    /// Wait until no async delivery is running; `false` on timeout
    async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return false;
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
