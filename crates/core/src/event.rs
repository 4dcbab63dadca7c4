// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable event records
//!
//! An [`Event`] never changes after it is built, so the bus shares one
//! `Arc<Event>` across every handler and queue that receives it.

use crate::error::EventError;
use crate::id::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered key/value payload (JSON object)
pub type Payload = Map<String, Value>;

/// One occurrence, routed by its dot-segmented type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    #[serde(rename = "type")]
    event_type: String,
    source: String,
    timestamp: DateTime<Utc>,
    correlation_id: EventId,
    #[serde(default)]
    causation_id: Option<EventId>,
    #[serde(default)]
    payload: Payload,
    #[serde(default)]
    metadata: Payload,
    #[serde(default)]
    is_replay: bool,
}

impl Event {
    /// Start building an event of the given type
    pub fn builder(event_type: impl Into<String>, source: impl Into<String>) -> EventBuilder {
        EventBuilder {
            event_type: event_type.into(),
            source: source.into(),
            payload: Payload::new(),
            metadata: Payload::new(),
            correlation_id: None,
            causation_id: None,
            is_replay: false,
        }
    }

    /// Build a root event with the given payload
    pub fn new(
        event_type: impl Into<String>,
        source: impl Into<String>,
        payload: Payload,
    ) -> Result<Self, EventError> {
        Self::builder(event_type, source).payload(payload).build()
    }

    /// Create a follow-up event in the same causal chain.
    ///
    /// The new event shares this event's correlation id and names this event
    /// as its cause. Source and metadata carry over; id and timestamp are new.
    pub fn derive(
        &self,
        event_type: impl Into<String>,
        payload: Payload,
    ) -> Result<Self, EventError> {
        Self::builder(event_type, self.source.clone())
            .payload(payload)
            .metadata(self.metadata.clone())
            .correlation_id(self.correlation_id.clone())
            .causation_id(self.id.clone())
            .build()
    }

    /// Copy of this event flagged as re-delivered history
    pub fn as_replay(&self) -> Self {
        Self {
            is_replay: true,
            ..self.clone()
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn correlation_id(&self) -> &EventId {
        &self.correlation_id
    }

    pub fn causation_id(&self) -> Option<&EventId> {
        self.causation_id.as_ref()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn metadata(&self) -> &Payload {
        &self.metadata
    }

    pub fn is_replay(&self) -> bool {
        self.is_replay
    }

    /// Look up a payload value by dot-path (`"container.health"`)
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        resolve_path(&self.payload, path)
    }
}

/// Walk dot-separated segments through nested objects
pub(crate) fn resolve_path<'a>(payload: &'a Payload, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = payload.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Builder for [`Event`]
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event_type: String,
    source: String,
    payload: Payload,
    metadata: Payload,
    correlation_id: Option<EventId>,
    causation_id: Option<EventId>,
    is_replay: bool,
}

impl EventBuilder {
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Set a single top-level payload field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn metadata(mut self, metadata: Payload) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn correlation_id(mut self, id: EventId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn causation_id(mut self, id: EventId) -> Self {
        self.causation_id = Some(id);
        self
    }

    pub fn replay(mut self, is_replay: bool) -> Self {
        self.is_replay = is_replay;
        self
    }

    pub fn build(self) -> Result<Event, EventError> {
        if self.event_type.is_empty() {
            return Err(EventError::EmptyType);
        }

        let id = EventId::generate();
        let correlation_id = self.correlation_id.unwrap_or_else(|| id.clone());

        Ok(Event {
            id,
            event_type: self.event_type,
            source: self.source,
            timestamp: Utc::now(),
            correlation_id,
            causation_id: self.causation_id,
            payload: self.payload,
            metadata: self.metadata,
            is_replay: self.is_replay,
        })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
