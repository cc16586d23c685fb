//! Port values and strict boolean coercion.
//!
//! Numeric outputs (`Value`) and logical conditions (`Signal`) are separate
//! types. The only bridge between them is [`Signal::coerce`], which treats a
//! value as true only when it is `Bool(true)` or a number exactly equal to 1.
//! An RSI of 52 is therefore *false* when wired into a logic gate.

use serde::Serialize;

/// A single value published on a node port.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Series(Vec<f64>),
    Null,
}

impl Value {
    /// Wrap an optional number, mapping `None` and non-finite values to `Null`.
    pub fn from_number(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Value::Number(v),
            _ => Value::Null,
        }
    }

    /// Numeric view used by comparison nodes: series reduce to their last
    /// element and booleans read as 1/0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Series(values) => values.last().copied(),
            Value::Null => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Value::Series(values) => Some(values),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::from_number(Some(v))
    }
}

/// A logical condition as seen by logic, signal and output nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    True,
    False,
    /// No input was connected or resolvable.
    Unset,
}

impl Signal {
    /// Strict coercion of a resolved input.
    pub fn coerce(value: Option<&Value>) -> Self {
        match value {
            None => Signal::Unset,
            Some(v) if strict_bool(v) => Signal::True,
            Some(_) => Signal::False,
        }
    }

    /// Fail-safe reading: `Unset` is false.
    pub fn is_true(self) -> bool {
        self == Signal::True
    }

    pub fn is_set(self) -> bool {
        self != Signal::Unset
    }

    /// `self` if set, else `other`.
    pub fn or(self, other: Signal) -> Signal {
        if self.is_set() { self } else { other }
    }

    pub fn negate(self) -> Signal {
        match self {
            Signal::True => Signal::False,
            Signal::False => Signal::True,
            Signal::Unset => Signal::Unset,
        }
    }

    /// Binary combination in which an unset side defers to the other one.
    pub fn combine(self, other: Signal, op: fn(bool, bool) -> bool) -> Signal {
        match (self, other) {
            (Signal::Unset, only) | (only, Signal::Unset) => only,
            (a, b) => op(a.is_true(), b.is_true()).into(),
        }
    }
}

impl From<bool> for Signal {
    fn from(b: bool) -> Self {
        if b { Signal::True } else { Signal::False }
    }
}

/// `true` only for `Bool(true)` and numbers exactly equal to `1.0`.
pub fn strict_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(v) => *v == 1.0,
        Value::Series(_) | Value::Null => false,
    }
}
