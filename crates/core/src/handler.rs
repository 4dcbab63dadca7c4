// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler capability for subscriptions

use crate::event::Event;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Result of one handler invocation; any error type can be returned with `?`
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Receives events delivered to a subscription
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, event: Arc<Event>) -> HandlerResult;
}

/// Plain closures over a borrowed event are handlers
#[async_trait]
impl<F> Handler for F
where
    F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
{
    async fn handle(&self, event: Arc<Event>) -> HandlerResult {
        (self)(&event)
    }
}

/// Adapts an async closure `Fn(Arc<Event>) -> Future` into a [`Handler`]
pub struct AsyncHandler<F> {
    f: F,
}

impl<F, Fut> AsyncHandler<F>
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Handler for AsyncHandler<F>
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, event: Arc<Event>) -> HandlerResult {
        (self.f)(event).await
    }
}
