//! In-process cache of `ConfigEntry` records.
//!
//! The cache is a plain concurrent map owned by whoever constructs it. It
//! has no TTL and no per-key eviction: entries stay until `clear()`. Expiry
//! of tokens is decided at read time by `ConfigAccessor`, not here.

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::ConfigEntry;

/// Shared handle to the entry cache. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct ConfigCache {
    entries: Arc<DashMap<String, ConfigEntry>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ConfigEntry> {
        self.entries.get(key).map(|v| v.clone())
    }

    /// Insert or overwrite the entry under its own key.
    pub fn put(&self, entry: ConfigEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
