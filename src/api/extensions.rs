//! Extension registry
//!
//! Extensions are extra commands served under their own path. They run
//! against the store under the same write lock as a batch command and
//! answer with the usual envelope.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::gateway::BatchResult;
use crate::models::KeyPairs;

/// A command served outside the built-in command set.
pub trait Extension: Send + Sync {
    /// Route path, including the leading slash.
    fn path(&self) -> &str;

    fn handle(&self, cache: &mut CacheStore, items: &KeyPairs) -> BatchResult;
}

// == Extension Registry ==
#[derive(Default, Clone)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn Extension>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an extension, replacing any extension already served on the
    /// same path.
    pub fn register(&mut self, extension: Arc<dyn Extension>) {
        match self
            .extensions
            .iter_mut()
            .find(|existing| existing.path() == extension.path())
        {
            Some(slot) => {
                info!(path = extension.path(), "Replacing extension");
                *slot = extension;
            }
            None => {
                debug!(path = extension.path(), "Registering extension");
                self.extensions.push(extension);
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&Arc<dyn Extension>> {
        self.extensions.iter().find(|extension| extension.path() == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Extension>> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// The extensions shipped with the server.
pub fn builtin_extensions() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    registry.register(Arc::new(ExistsExtension));
    registry
}

// == Exists ==
/// `/exists`: reports, per key, whether the key currently holds a value.
pub struct ExistsExtension;

impl Extension for ExistsExtension {
    fn path(&self) -> &str {
        "/exists"
    }

    fn handle(&self, cache: &mut CacheStore, items: &KeyPairs) -> BatchResult {
        cache.fire_due();
        BatchResult::from_list(items.keys().map(|key| Value::Bool(cache.contains(key))))
    }
}
