// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber-declared event patterns
//!
//! This module provides:
//! - `TypePattern` - dot-segment type matching with `*` and trailing `**`
//! - `AttributeFilter` - `$eq`/`$gt`/`$in`/... conditions on payload paths
//! - `EventPattern` - a type pattern plus its filters, immutable once built

mod filter;
mod segments;

pub use filter::{parse_filter_spec, AttributeFilter, FilterOp};
pub use segments::TypePattern;

use crate::error::PatternCompileError;
use crate::event::{resolve_path, Event, Payload};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PATTERN_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a constructed pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatternKey(u64);

impl PatternKey {
    fn next() -> Self {
        Self(NEXT_PATTERN_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Type pattern plus attribute filters.
///
/// Construction validates everything; matching never fails.
#[derive(Clone, Debug)]
pub struct EventPattern {
    key: PatternKey,
    type_pattern: TypePattern,
    filters: Vec<(String, AttributeFilter)>,
}

impl EventPattern {
    pub fn new(type_pattern: &str) -> Result<Self, PatternCompileError> {
        Ok(Self {
            key: PatternKey::next(),
            type_pattern: TypePattern::parse(type_pattern)?,
            filters: Vec::new(),
        })
    }

    /// Add a filter on a dot-path into the payload
    pub fn with_filter(
        mut self,
        path: &str,
        filter: AttributeFilter,
    ) -> Result<Self, PatternCompileError> {
        filter::validate_path(path)?;
        filter.validate(path)?;
        self.filters.push((path.to_string(), filter));
        Ok(self)
    }

    /// Add filters parsed from a JSON filter spec
    pub fn with_filter_spec(mut self, spec: &Value) -> Result<Self, PatternCompileError> {
        self.filters.extend(parse_filter_spec(spec)?);
        Ok(self)
    }

    pub fn key(&self) -> PatternKey {
        self.key
    }

    pub fn type_pattern(&self) -> &TypePattern {
        &self.type_pattern
    }

    pub fn as_str(&self) -> &str {
        self.type_pattern.as_str()
    }

    pub fn filters(&self) -> &[(String, AttributeFilter)] {
        &self.filters
    }

    /// Type check by segment walk
    pub fn matches_type(&self, event_type: &str) -> bool {
        self.type_pattern.matches(event_type)
    }

    /// Every filter satisfied (vacuously true with none)
    pub fn matches_attributes(&self, payload: &Payload) -> bool {
        self.filters
            .iter()
            .all(|(path, filter)| filter.evaluate(resolve_path(payload, path)))
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.matches_type(event.event_type()) && self.matches_attributes(event.payload())
    }
}

impl FromStr for EventPattern {
    type Err = PatternCompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl PartialEq for EventPattern {
    fn eq(&self, other: &Self) -> bool {
        self.type_pattern == other.type_pattern && self.filters == other.filters
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_pattern.as_str())?;
        if !self.filters.is_empty() {
            let parts: Vec<String> = self
                .filters
                .iter()
                .map(|(path, filter)| format!("{} {}", path, filter))
                .collect();
            write!(f, "[{}]", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Anything `subscribe` accepts as a pattern
pub trait IntoPattern {
    fn into_pattern(self) -> Result<EventPattern, PatternCompileError>;
}

impl IntoPattern for EventPattern {
    fn into_pattern(self) -> Result<EventPattern, PatternCompileError> {
        Ok(self)
    }
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<EventPattern, PatternCompileError> {
        EventPattern::new(self)
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<EventPattern, PatternCompileError> {
        EventPattern::new(&self)
    }
}

impl IntoPattern for Result<EventPattern, PatternCompileError> {
    fn into_pattern(self) -> Result<EventPattern, PatternCompileError> {
        self
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
