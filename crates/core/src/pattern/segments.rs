// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dot-segmented type patterns
//!
//! Supports:
//!   - Exact: "container.started"
//!   - Single wildcard: "container.*" matches "container.started", "container.stopped"
//!   - Trailing globstar: "container.**" matches "container", "container.health.changed"

use crate::error::PatternCompileError;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one non-empty segment
    One,
    /// `**`: zero or more remaining segments, final position only
    Rest,
}

/// A validated type pattern with a lazily compiled regex
#[derive(Clone, Debug)]
pub struct TypePattern {
    raw: String,
    segments: Vec<Segment>,
    compiled: OnceLock<Option<Regex>>,
}

impl TypePattern {
    pub fn parse(raw: &str) -> Result<Self, PatternCompileError> {
        if raw.is_empty() {
            return Err(PatternCompileError::Empty);
        }

        let parts: Vec<&str> = raw.split('.').collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());

        for (i, part) in parts.iter().enumerate() {
            let segment = match *part {
                "" => {
                    return Err(PatternCompileError::EmptySegment {
                        pattern: raw.to_string(),
                    })
                }
                "**" if i == last => Segment::Rest,
                "**" => {
                    return Err(PatternCompileError::MisplacedGlobstar {
                        pattern: raw.to_string(),
                    })
                }
                "*" => Segment::One,
                p if p.contains('*') => {
                    return Err(PatternCompileError::PartialWildcard {
                        pattern: raw.to_string(),
                        segment: p.to_string(),
                    })
                }
                p => Segment::Literal(p.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            compiled: OnceLock::new(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern contains no wildcards
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Match by walking segments (no compiled state)
    pub fn matches(&self, event_type: &str) -> bool {
        let event_parts: Vec<&str> = event_type.split('.').collect();
        Self::match_segments(&self.segments, &event_parts)
    }

    fn match_segments(pattern: &[Segment], event: &[&str]) -> bool {
        match (pattern.first(), event.first()) {
            (Some(Segment::Rest), _) => true,
            (None, None) => true,
            (Some(Segment::One), Some(e)) if !e.is_empty() => {
                Self::match_segments(&pattern[1..], &event[1..])
            }
            (Some(Segment::Literal(p)), Some(e)) if p == e => {
                Self::match_segments(&pattern[1..], &event[1..])
            }
            _ => false,
        }
    }

    /// Match using the anchored regex, compiling it on first use.
    ///
    /// Falls back to the segment walk if the regex could not be built.
    pub fn matches_compiled(&self, event_type: &str) -> bool {
        match self.regex() {
            Some(re) => re.is_match(event_type),
            None => self.matches(event_type),
        }
    }

    /// The compiled regex, if compilation has succeeded
    pub fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| match Regex::new(&self.regex_source()) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(pattern = %self.raw, error = %e, "type pattern regex failed to compile");
                    None
                }
            })
            .as_ref()
    }

    /// Whether the regex has been built yet
    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    fn regex_source(&self) -> String {
        let mut source = String::from("^");
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Rest if i == 0 => source.push_str(".*"),
                Segment::Rest => source.push_str(r"(?:\..*)?"),
                Segment::One | Segment::Literal(_) => {
                    if i > 0 {
                        source.push_str(r"\.");
                    }
                    match segment {
                        Segment::Literal(lit) => source.push_str(&regex::escape(lit)),
                        _ => source.push_str("[^.]+"),
                    }
                }
            }
        }
        source.push('$');
        source
    }
}

impl PartialEq for TypePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for TypePattern {}

#[cfg(test)]
#[path = "segments_tests.rs"]
mod tests;
