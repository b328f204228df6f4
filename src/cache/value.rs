//! Cache Value Module
//!
//! Values are either plain text or integers produced by INCR/DECR. Both
//! serialize to their natural JSON form, so snapshots written by older
//! servers (which stored incremented values as numbers) load unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Value ==
/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    Integer(i64),
    Text(String),
}

impl CacheValue {
    /// Interprets the value as an integer, if it is integer-coercible.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CacheValue::Integer(n) => Some(*n),
            CacheValue::Text(text) => parse_integer(text),
        }
    }

    /// Approximate number of bytes held by the value.
    pub fn byte_len(&self) -> usize {
        match self {
            CacheValue::Integer(_) => std::mem::size_of::<i64>(),
            CacheValue::Text(text) => text.len(),
        }
    }

    /// Converts the value into its wire representation.
    pub fn to_json(&self) -> Value {
        match self {
            CacheValue::Integer(n) => Value::from(*n),
            CacheValue::Text(text) => Value::from(text.as_str()),
        }
    }
}

impl From<String> for CacheValue {
    fn from(text: String) -> Self {
        CacheValue::Text(text)
    }
}

impl From<&str> for CacheValue {
    fn from(text: &str) -> Self {
        CacheValue::Text(text.to_string())
    }
}

impl From<i64> for CacheValue {
    fn from(n: i64) -> Self {
        CacheValue::Integer(n)
    }
}

impl std::fmt::Display for CacheValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheValue::Integer(n) => write!(f, "{}", n),
            CacheValue::Text(text) => f.write_str(text),
        }
    }
}

// == Numeric Coercion ==
/// Parses an integer-coercible string.
///
/// Surrounding whitespace is ignored. Decimal input is accepted and
/// truncated toward zero. Empty, non-numeric, non-finite and out-of-range
/// input yields `None`.
pub fn parse_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }

    let float = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    let truncated = float.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return None;
    }
    Some(truncated as i64)
}
