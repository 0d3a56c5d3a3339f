use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A flat remote record as returned by the store: column name to JSON value.
pub type Row = Map<String, Value>;

/// Identifier assigned by the remote store.
///
/// Products and orders are keyed by serial integers, coupons by text (UUID),
/// so both shapes have to round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Reads an id out of a row column. Floats and other shapes are rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl std::str::FromStr for EntityId {
    type Err = std::convert::Infallible;

    /// Numeric text becomes `Int`, anything else stays `Text`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Text(s.to_string())))
    }
}

// Lenient column readers. Remote rows are nullable and loosely typed, so every
// read path goes through these instead of indexing the map directly.

/// Non-empty string column, or `fallback` when missing, null, empty or not a string.
pub fn text_or(row: &Row, key: &str, fallback: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => fallback.to_string(),
    }
}

/// Optional string column; empty strings are kept.
pub fn opt_text(row: &Row, key: &str) -> Option<String> {
    row.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Numeric column, accepting numbers and numeric strings. Anything else is zero.
pub fn number_or_zero(row: &Row, key: &str) -> f64 {
    row.get(key).map(coerce_number).unwrap_or(0.0)
}

pub fn flag(row: &Row, key: &str) -> bool {
    matches!(row.get(key), Some(Value::Bool(true)))
}

/// String array column. Non-string elements are skipped; a non-array is empty.
pub fn string_list(row: &Row, key: &str) -> Vec<String> {
    match row.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Coerces a JSON value to a number the way a loose `Number(x) || 0` would:
/// numeric strings parse, non-finite or unparseable values become zero.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

/// Non-negative whole count from a loosely typed value. Fractions truncate,
/// negatives clamp to zero.
pub fn coerce_count(value: &Value) -> u32 {
    let n = coerce_number(value);
    if n <= 0.0 {
        0
    } else if n >= u32::MAX as f64 {
        u32::MAX
    } else {
        n as u32
    }
}
