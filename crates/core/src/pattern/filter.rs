// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attribute filters over event payloads

use crate::error::PatternCompileError;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of an attribute filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Exists,
}

impl FilterOp {
    pub fn parse(op: &str) -> Option<Self> {
        let op = match op {
            "$eq" => FilterOp::Eq,
            "$ne" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::Nin,
            "$exists" => FilterOp::Exists,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Ne => "$ne",
            FilterOp::Gt => "$gt",
            FilterOp::Gte => "$gte",
            FilterOp::Lt => "$lt",
            FilterOp::Lte => "$lte",
            FilterOp::In => "$in",
            FilterOp::Nin => "$nin",
            FilterOp::Exists => "$exists",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{operator, value}` condition on a payload path
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeFilter {
    op: FilterOp,
    value: Value,
}

impl AttributeFilter {
    /// Unchecked constructor; operands are validated when the filter is
    /// attached to a pattern.
    pub fn new(op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            op,
            value: value.into(),
        }
    }

    pub fn eq(value: impl Into<Value>) -> Self {
        Self::new(FilterOp::Eq, value)
    }

    pub fn ne(value: impl Into<Value>) -> Self {
        Self::new(FilterOp::Ne, value)
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Self::new(FilterOp::Gt, value)
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        Self::new(FilterOp::Gte, value)
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Self::new(FilterOp::Lt, value)
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Self::new(FilterOp::Lte, value)
    }

    pub fn one_of<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::new(FilterOp::In, Value::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn none_of<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::new(FilterOp::Nin, Value::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn exists(present: bool) -> Self {
        Self::new(FilterOp::Exists, present)
    }

    pub fn op(&self) -> FilterOp {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Check the operand has the shape the operator needs
    pub(crate) fn validate(&self, path: &str) -> Result<(), PatternCompileError> {
        let reason = match self.op {
            FilterOp::In | FilterOp::Nin if !self.value.is_array() => {
                format!("{} expects an array", self.op)
            }
            FilterOp::Exists if !self.value.is_boolean() => {
                format!("{} expects a boolean", self.op)
            }
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte
                if !self.value.is_number() =>
            {
                format!("{} expects a number", self.op)
            }
            _ => return Ok(()),
        };
        Err(PatternCompileError::InvalidFilter {
            path: path.to_string(),
            reason,
        })
    }

    /// Evaluate against the resolved payload value (`None` = path missing).
    ///
    /// Type mismatches evaluate to false rather than erroring.
    pub fn evaluate(&self, actual: Option<&Value>) -> bool {
        let actual = match (self.op, actual) {
            (FilterOp::Exists, found) => return self.value.as_bool() == Some(found.is_some()),
            (_, None) => return false,
            (_, Some(actual)) => actual,
        };

        match self.op {
            FilterOp::Eq => values_equal(actual, &self.value),
            FilterOp::Ne => !values_equal(actual, &self.value),
            FilterOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c))),
            FilterOp::Nin => self
                .value
                .as_array()
                .is_some_and(|candidates| !candidates.iter().any(|c| values_equal(actual, c))),
            FilterOp::Exists => false,
        }
    }
}

impl fmt::Display for AttributeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.value)
    }
}

/// Parse a JSON filter spec: `{"path": {"$op": value, ...}, "other": literal}`.
///
/// A condition with no `$`-prefixed keys is shorthand for `$eq`.
pub fn parse_filter_spec(spec: &Value) -> Result<Vec<(String, AttributeFilter)>, PatternCompileError> {
    let Some(entries) = spec.as_object() else {
        return Err(PatternCompileError::InvalidFilter {
            path: String::new(),
            reason: "filter spec must be an object".to_string(),
        });
    };

    let mut filters = Vec::new();
    for (path, condition) in entries {
        validate_path(path)?;
        match condition {
            Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                for (op, operand) in ops {
                    let Some(op) = FilterOp::parse(op) else {
                        return Err(PatternCompileError::InvalidFilter {
                            path: path.clone(),
                            reason: format!("unknown operator '{}'", op),
                        });
                    };
                    let filter = AttributeFilter::new(op, operand.clone());
                    filter.validate(path)?;
                    filters.push((path.clone(), filter));
                }
            }
            literal => filters.push((path.clone(), AttributeFilter::eq(literal.clone()))),
        }
    }
    Ok(filters)
}

pub(crate) fn validate_path(path: &str) -> Result<(), PatternCompileError> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(PatternCompileError::InvalidFilter {
            path: path.to_string(),
            reason: "path must be non-empty dot-separated keys".to_string(),
        });
    }
    Ok(())
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
