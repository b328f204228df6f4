//! Request DTOs for the cache server API
//!
//! A request is an ordered list of key/value pairs, merged from the URL
//! query and the body.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Ordered key/value pairs of one request.
///
/// Values are optional: read-style commands only use keys. Inserting an
/// existing key replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPairs {
    pairs: IndexMap<String, Option<String>>,
}

impl KeyPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.pairs.insert(key.into(), value);
    }

    /// Merges `other` into `self`; values from `other` win.
    pub fn merge(&mut self, other: KeyPairs) {
        self.pairs.extend(other.pairs);
    }

    /// Builds pairs from a JSON object body.
    ///
    /// Strings are used verbatim, `null` becomes an absent value and any
    /// other JSON value is stored in its JSON text form.
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        object
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Null => None,
                    Value::String(text) => Some(text),
                    other => Some(other.to_string()),
                };
                (key, value)
            })
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.pairs.get(key).map(|value| value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for KeyPairs {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, String)> for KeyPairs {
    fn from_iter<I: IntoIterator<Item = (K, String)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(key, value)| (key, Some(value)))
            .collect()
    }
}
