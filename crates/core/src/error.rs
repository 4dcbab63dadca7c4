// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the routing core

use crate::id::{EventId, SubscriptionId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event type cannot be empty")]
    EmptyType,
}

/// A pattern (type or filter spec) that cannot be compiled.
///
/// Raised synchronously at construction or `subscribe` time; no subscription
/// is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternCompileError {
    #[error("type pattern cannot be empty")]
    Empty,
    #[error("empty segment in type pattern '{pattern}'")]
    EmptySegment { pattern: String },
    #[error("'**' may only appear as the final segment: '{pattern}'")]
    MisplacedGlobstar { pattern: String },
    #[error("segment '{segment}' in '{pattern}' mixes '*' with other characters")]
    PartialWildcard { pattern: String, segment: String },
    #[error("invalid filter for '{path}': {reason}")]
    InvalidFilter { path: String, reason: String },
}

/// A handler returned an error while processing an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler for subscription {subscription_id} failed on event {event_id}: {message}")]
pub struct HandlerExecutionError {
    pub subscription_id: SubscriptionId,
    pub event_id: EventId,
    pub message: String,
}

/// A bounded queue had no room for another event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is at capacity ({capacity})")]
pub struct QueueCapacityError {
    pub capacity: usize,
}

/// Errors from a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnqueueError {
    #[error(transparent)]
    Capacity(#[from] QueueCapacityError),
    #[error("queue is closed")]
    Closed,
}

/// Reasons a blocking dequeue returned without an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DequeueError {
    #[error("timed out waiting for an event")]
    Timeout,
    #[error("queue is closed")]
    Closed,
}

/// A single failed delivery, isolated to one subscription
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] HandlerExecutionError),
    #[error("enqueue for subscription {subscription_id} failed: {source}")]
    Queue {
        subscription_id: SubscriptionId,
        #[source]
        source: EnqueueError,
    },
}

/// Errors surfaced by the bus itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("event bus is shut down")]
    ShutDown,
}

/// Reasons a subscription could not be created
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    #[error(transparent)]
    Pattern(#[from] PatternCompileError),
    #[error("subscription id already registered: {0}")]
    DuplicateId(SubscriptionId),
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Unrecognized delivery mode name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid delivery mode: {0}. Valid modes are: sync, async, queued")]
pub struct InvalidDeliveryMode(pub String);

/// Errors loading bus configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
