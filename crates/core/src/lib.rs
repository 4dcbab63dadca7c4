// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! evr-core: in-process event routing
//!
//! This crate provides:
//! - Immutable events with correlation and causation tracking
//! - Type patterns with `*`/`**` wildcards and payload attribute filters
//! - Interchangeable pattern matchers, including a bounded decision cache
//! - A subscription registry with priority, TTL and delivery budgets
//! - An event bus with sync, async and queued delivery

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod error;
pub mod id;

pub mod event;
pub mod pattern;

// Routing (order matters for dependencies)
pub mod matcher;
pub mod handler;
pub mod queue;
pub mod subscription;
pub mod registry;
pub mod sweep;
pub mod config;
pub mod bus;

// Re-exports
pub use bus::{
    BusStats, DispatchFailure, DispatchOutcome, EventBus, HookId, PublishReport, SkipReason,
    CONFIRMATION_EVENT_TYPE, ROUTER_SOURCE,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::BusConfig;
pub use error::{
    BusError, ConfigError, DequeueError, DispatchError, EnqueueError, EventError,
    HandlerExecutionError, InvalidDeliveryMode, PatternCompileError, QueueCapacityError,
    SubscribeError,
};
pub use event::{Event, EventBuilder, Payload};
pub use handler::{AsyncHandler, Handler, HandlerResult};
pub use id::{EventId, IdGen, SequentialIdGen, SubscriptionId, UuidIdGen};
pub use matcher::{
    CacheStats, CachedPatternMatcher, DefaultPatternMatcher, MatcherKind, PatternMatcher,
    WildcardPatternMatcher,
};
pub use pattern::{AttributeFilter, EventPattern, FilterOp, IntoPattern, TypePattern};
pub use queue::{EventQueue, InMemoryEventQueue};
pub use subscription::{
    DeliveryMode, SubscribeOptions, Subscription, SubscriptionInfo, SubscriptionState,
};
pub use sweep::{SweepConfig, SweepStats};
