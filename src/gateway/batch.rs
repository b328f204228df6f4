//! Batch Result Envelope
//!
//! `response` holds the successes in input order and is dense; `errors`
//! carries the input position of each failed item. The two lists are not
//! positionally aligned: correlate failures through `ItemError::index`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CacheError, Result};

/// A failed item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub message: String,
    /// Position of the failed item in the request
    pub index: usize,
}

/// Response envelope shared by every command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub errors: Vec<ItemError>,
    pub response: Vec<Value>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Envelope for a single-item command.
    pub fn single(result: Result<Value>) -> Self {
        let mut batch = Self::new();
        batch.record(0, result);
        batch
    }

    /// Envelope carrying one gateway-level error.
    pub fn failed(error: &CacheError) -> Self {
        let mut batch = Self::new();
        batch.push_err(0, error);
        batch
    }

    /// Envelope whose response is the given list.
    pub fn from_list(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            errors: Vec::new(),
            response: values.into_iter().collect(),
        }
    }

    /// Appends the outcome of the item at input position `index`.
    pub fn record(&mut self, index: usize, result: Result<Value>) {
        match result {
            Ok(value) => self.push_ok(value),
            Err(error) => self.push_err(index, &error),
        }
    }

    pub fn push_ok(&mut self, value: Value) {
        self.response.push(value);
    }

    pub fn push_err(&mut self, index: usize, error: &CacheError) {
        self.errors.push(ItemError {
            message: error.to_string(),
            index,
        });
    }

    /// Returns true if no item failed.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_keeps_response_dense() {
        let mut batch = BatchResult::new();
        batch.record(0, Ok(json!(1)));
        batch.record(1, Err(CacheError::Validation("bad".to_string())));
        batch.record(2, Ok(json!(3)));

        assert_eq!(batch.response, vec![json!(1), json!(3)]);
        assert_eq!(
            batch.errors,
            vec![ItemError {
                message: "bad".to_string(),
                index: 1
            }]
        );
        assert!(!batch.is_ok());
    }

    #[test]
    fn test_single() {
        let ok = BatchResult::single(Ok(json!("PONG")));
        assert_eq!(ok.response.len(), 1);
        assert!(ok.is_ok());

        let err = BatchResult::single(Err(CacheError::Internal("x".to_string())));
        assert!(err.response.is_empty());
        assert_eq!(err.errors[0].index, 0);
    }

    #[test]
    fn test_wire_shape() {
        let batch = BatchResult::failed(&CacheError::DisabledCommand("FLUSH".to_string()));
        let json = serde_json::to_value(&batch).unwrap();

        assert_eq!(
            json,
            json!({
                "errors": [{"message": "Command FLUSH is not enabled.", "index": 0}],
                "response": []
            })
        );
    }
}
