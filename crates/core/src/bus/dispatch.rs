// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Matching, ordering and per-mode delivery

use super::hooks::DispatchFailure;
use super::report::{DispatchOutcome, PublishReport, SkipReason};
use super::stats::Counters;
use super::{Inner, CONFIRMATION_EVENT_TYPE, ROUTER_SOURCE};
use crate::clock::Clock;
use crate::error::{BusError, DispatchError, HandlerExecutionError};
use crate::event::Event;
use crate::id::{IdGen, SubscriptionId};
use crate::registry::{dispatch_order, Claim};
use crate::subscription::{DeliveryMode, Subscription};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;

type RouteFuture = Pin<Box<dyn Future<Output = Result<PublishReport, BusError>> + Send>>;

/// Counts one spawned async delivery until dropped
struct InFlight<C: Clock, I: IdGen> {
    inner: Arc<Inner<C, I>>,
}

impl<C: Clock, I: IdGen> InFlight<C, I> {
    fn enter(inner: Arc<Inner<C, I>>) -> Self {
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        Self { inner }
    }
}

impl<C: Clock, I: IdGen> Drop for InFlight<C, I> {
    fn drop(&mut self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

impl<C: Clock, I: IdGen> Inner<C, I> {
    /// Boxed so confirmation publishing can re-enter routing
    pub(super) fn route(self: Arc<Self>, event: Arc<Event>) -> RouteFuture {
        Box::pin(async move {
            if self.is_shut_down() {
                tracing::warn!(
                    event_id = %event.id(),
                    event_type = event.event_type(),
                    "publish rejected, bus is shut down"
                );
                return Err(BusError::ShutDown);
            }

            let started = std::time::Instant::now();
            Counters::bump(&self.counters.published);

            // Confirmations are never confirmed themselves
            let confirm = self.config.delivery_confirmations
                && event.event_type() != CONFIRMATION_EVENT_TYPE;

            let mut matched: Vec<Arc<Subscription>> = self
                .registry
                .snapshot()
                .into_iter()
                .filter(|sub| self.matcher.matches(sub.pattern(), &event))
                .collect();
            dispatch_order(&mut matched);

            let mut report = PublishReport::new(event.id().clone(), matched.len());
            for sub in &matched {
                let outcome = self.dispatch_one(sub, &event, confirm).await;
                report.record(sub.id().clone(), outcome);
            }

            tracing::debug!(
                event_id = %event.id(),
                event_type = event.event_type(),
                matched = report.matched(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "published"
            );
            Ok(report)
        })
    }

    async fn dispatch_one(
        self: &Arc<Self>,
        sub: &Arc<Subscription>,
        event: &Arc<Event>,
        confirm: bool,
    ) -> DispatchOutcome {
        let last = match self.registry.claim(sub.id(), self.clock.now()) {
            Claim::Granted { last, .. } => last,
            Claim::Expired => {
                Counters::bump(&self.counters.expired_subscriptions);
                if let Some(queue) = sub.queue() {
                    queue.close();
                }
                tracing::debug!(subscription_id = %sub.id(), "subscription expired");
                return DispatchOutcome::Skipped(SkipReason::Expired);
            }
            Claim::Exhausted => return DispatchOutcome::Skipped(SkipReason::Exhausted),
            Claim::Inactive => return DispatchOutcome::Skipped(SkipReason::Inactive),
        };

        if last {
            tracing::debug!(subscription_id = %sub.id(), "subscription reached max_events");
        }

        self.counters.attempted(sub.delivery_mode());
        match sub.delivery_mode() {
            DeliveryMode::Sync => {
                let result = self.invoke(sub, event).await;
                if confirm {
                    self.confirm(event, sub.id(), &result).await;
                }
                match result {
                    Ok(()) => DispatchOutcome::Delivered,
                    Err(err) => DispatchOutcome::Failed(err),
                }
            }
            DeliveryMode::Async => {
                self.spawn_delivery(sub, event, confirm);
                DispatchOutcome::Scheduled
            }
            DeliveryMode::Queued => {
                let result = self.enqueue(sub, event, last);
                if confirm {
                    self.confirm(event, sub.id(), &result).await;
                }
                match result {
                    Ok(()) => DispatchOutcome::Enqueued,
                    Err(err) => DispatchOutcome::Failed(err),
                }
            }
        }
    }

    /// Run the handler, recording the outcome. A panic counts as a failure.
    pub(super) async fn invoke(
        &self,
        sub: &Subscription,
        event: &Arc<Event>,
    ) -> Result<(), DispatchError> {
        let result = AssertUnwindSafe(sub.handler.handle(Arc::clone(event)))
            .catch_unwind()
            .await;
        let message = match result {
            Ok(Ok(())) => {
                Counters::bump(&self.counters.successful_deliveries);
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("handler panicked: {}", panic_message(payload.as_ref())),
        };

        let error = DispatchError::Handler(HandlerExecutionError {
            subscription_id: sub.id().clone(),
            event_id: event.id().clone(),
            message,
        });
        self.record_failure(sub, event, error.clone());
        Err(error)
    }

    fn spawn_delivery(self: &Arc<Self>, sub: &Arc<Subscription>, event: &Arc<Event>, confirm: bool) {
        let guard = InFlight::enter(Arc::clone(self));
        let sub = Arc::clone(sub);
        let event = Arc::clone(event);

        tokio::spawn(async move {
            let inner = &guard.inner;
            let Ok(_permit) = Arc::clone(&inner.deliveries).acquire_owned().await else {
                return;
            };
            let result = inner.invoke(&sub, &event).await;
            if confirm {
                inner.confirm(&event, sub.id(), &result).await;
            }
        });
    }

    fn enqueue(
        &self,
        sub: &Subscription,
        event: &Arc<Event>,
        last: bool,
    ) -> Result<(), DispatchError> {
        let Some(queue) = sub.queue() else {
            return Ok(());
        };

        let result = queue
            .enqueue(Arc::clone(event))
            .map_err(|source| DispatchError::Queue {
                subscription_id: sub.id().clone(),
                source,
            });
        match &result {
            Err(error) => {
                // The event never reached the subscriber, so it keeps its budget
                self.registry.release(sub.id());
                self.record_failure(sub, event, error.clone());
            }
            // Consumers drain what is buffered, then see the queue closed
            Ok(()) if last => queue.close(),
            Ok(()) => {}
        }
        result
    }

    fn record_failure(&self, sub: &Subscription, event: &Arc<Event>, error: DispatchError) {
        Counters::bump(&self.counters.dispatch_failures);
        tracing::warn!(
            subscription_id = %sub.id(),
            event_id = %event.id(),
            event_type = event.event_type(),
            error = %error,
            "dispatch failed"
        );
        self.hooks.notify(&DispatchFailure {
            subscription_id: sub.id().clone(),
            event: Arc::clone(event),
            error,
        });
    }

    async fn confirm(
        self: &Arc<Self>,
        event: &Event,
        subscription_id: &SubscriptionId,
        result: &Result<(), DispatchError>,
    ) {
        let confirmation = Event::builder(CONFIRMATION_EVENT_TYPE, ROUTER_SOURCE)
            .field("original_event_id", event.id().as_str())
            .field("original_event_type", event.event_type())
            .field("subscription_id", subscription_id.as_str())
            .field("success", result.is_ok())
            .field(
                "error_message",
                result.as_ref().err().map(|e| e.to_string()),
            )
            .correlation_id(event.correlation_id().clone())
            .causation_id(event.id().clone())
            .build();

        match confirmation {
            Ok(confirmation) => {
                if let Err(e) = Arc::clone(self).route(Arc::new(confirmation)).await {
                    tracing::debug!(error = %e, "delivery confirmation dropped");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to build delivery confirmation"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
