// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern matching strategies
//!
//! All strategies agree on results; they differ only in how the type
//! decision is computed. Attribute filters always run per call because they
//! depend on payload contents.

use crate::event::Event;
use crate::pattern::{EventPattern, PatternKey};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Decides whether a pattern matches an event
pub trait PatternMatcher: Send + Sync {
    fn matches_type(&self, pattern: &EventPattern, event_type: &str) -> bool;

    fn matches(&self, pattern: &EventPattern, event: &Event) -> bool {
        self.matches_type(pattern, event.event_type())
            && pattern.matches_attributes(event.payload())
    }

    /// Short name for stats and logs
    fn name(&self) -> &'static str;

    /// Cache counters, for matchers that keep a cache
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

/// Re-evaluates the segment walk on every call
#[derive(Clone, Debug, Default)]
pub struct DefaultPatternMatcher;

impl PatternMatcher for DefaultPatternMatcher {
    fn matches_type(&self, pattern: &EventPattern, event_type: &str) -> bool {
        pattern.matches_type(event_type)
    }

    fn name(&self) -> &'static str {
        "default"
    }
}

/// Uses the anchored regex compiled once and stored on the pattern
#[derive(Clone, Debug, Default)]
pub struct WildcardPatternMatcher;

impl PatternMatcher for WildcardPatternMatcher {
    fn matches_type(&self, pattern: &EventPattern, event_type: &str) -> bool {
        pattern.type_pattern().matches_compiled(event_type)
    }

    fn name(&self) -> &'static str {
        "wildcard"
    }
}

/// Cache statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct TypeCache {
    decisions: HashMap<(PatternKey, String), bool>,
    order: VecDeque<(PatternKey, String)>,
}

/// Wraps another matcher and memoizes only the type decision.
///
/// Keyed by (pattern identity, event type). When full, the oldest inserted
/// entry is evicted.
pub struct CachedPatternMatcher<M = WildcardPatternMatcher> {
    inner: M,
    capacity: usize,
    cache: Mutex<TypeCache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<M: PatternMatcher> CachedPatternMatcher<M> {
    pub fn new(inner: M, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            cache: Mutex::new(TypeCache::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.decisions.clear();
        cache.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        CacheStats {
            entries: cache.decisions.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<M: PatternMatcher> PatternMatcher for CachedPatternMatcher<M> {
    fn matches_type(&self, pattern: &EventPattern, event_type: &str) -> bool {
        let key = (pattern.key(), event_type.to_string());

        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(&decision) = cache.decisions.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return decision;
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let decision = self.inner.matches_type(pattern, event_type);

        if self.capacity == 0 {
            return decision;
        }

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if !cache.decisions.contains_key(&key) {
            while cache.decisions.len() >= self.capacity {
                match cache.order.pop_front() {
                    Some(oldest) => {
                        cache.decisions.remove(&oldest);
                    }
                    None => break,
                }
            }
            cache.order.push_back(key.clone());
            cache.decisions.insert(key, decision);
        }

        decision
    }

    fn name(&self) -> &'static str {
        "cached"
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.stats())
    }
}

/// Matcher selection for configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Default,
    Wildcard,
    #[default]
    Cached,
}

impl MatcherKind {
    pub fn build(self, cache_capacity: usize) -> Arc<dyn PatternMatcher> {
        match self {
            MatcherKind::Default => Arc::new(DefaultPatternMatcher),
            MatcherKind::Wildcard => Arc::new(WildcardPatternMatcher),
            MatcherKind::Cached => Arc::new(CachedPatternMatcher::new(
                WildcardPatternMatcher,
                cache_capacity,
            )),
        }
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
