//! Cache Module
//!
//! Provides the in-memory key/value store with per-key expiry.

mod expiry;
mod stats;
mod store;
mod value;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use expiry::{ExpiryHandle, ExpirySchedule};
pub use stats::CacheStats;
pub use store::{CacheStore, PONG};
pub use value::{parse_integer, CacheValue};

/// Store handle shared between the gateway, backup manager and background tasks.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
