//! Manifest cache shared by all lookups of one resolver.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::trace;

/// Manifests keyed by webpackage id, and by artifact id once an artifact was
/// resolved from them.
///
/// Entries are written once: adding a key that is already present keeps the
/// first value.
#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl ManifestCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `manifest` under `key` unless the key is already present.
    pub fn add_item(&self, key: &str, manifest: Value) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(key) {
            trace!(key, "Caching manifest");
            entries.insert(key.to_string(), manifest);
        }
    }

    /// The manifest stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
