//! Read-through access to configuration entries.
//!
//! `ConfigAccessor` puts a `ConfigCache` in front of a `ConfigStore`:
//! - reads hit the cache first and fall back to the store, caching what they find
//! - writes go to the store first, then to the cache
//! - nothing is negatively cached; a missing key is re-read from the store every time
//!
//! Expiry is only enforced by `get_config_with_expiry`. Stale entries stay in
//! the cache until they are overwritten or the whole cache is cleared.

use std::sync::Arc;

use tracing::debug;

use crate::cache::ConfigCache;
use crate::model::{ConfigEntry, now_millis};
use crate::store::{ConfigStore, StoreResult};

#[derive(Clone)]
pub struct ConfigAccessor {
    cache: ConfigCache,
    store: Arc<dyn ConfigStore>,
}

impl ConfigAccessor {
    pub fn new(cache: ConfigCache, store: Arc<dyn ConfigStore>) -> Self {
        Self { cache, store }
    }

    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }

    /// Insert the entry when the store has nothing under `key`.
    ///
    /// The cache is primed only when the insert actually happens. Returns
    /// whether it did.
    pub async fn create_when_not_exist(
        &self,
        key: &str,
        value: &str,
        refresh_time: i64,
    ) -> StoreResult<bool> {
        if self.store.find_by_key(key).await?.is_some() {
            debug!(key, "entry exists; create skipped");
            return Ok(false);
        }
        let entry = ConfigEntry::new(key, Some(value.to_string()), refresh_time);
        let inserted = self.store.create_if_absent(&entry).await?;
        if inserted {
            self.cache.put(entry);
        }
        Ok(inserted)
    }

    /// Write through to the store, then overwrite the cached copy.
    pub async fn upsert(&self, key: &str, value: &str, refresh_time: i64) -> StoreResult<()> {
        let entry = ConfigEntry::new(key, Some(value.to_string()), refresh_time);
        self.store.upsert(&entry).await?;
        self.cache.put(entry);
        Ok(())
    }

    /// Cached entry for `key`, falling back to the store on a miss.
    ///
    /// A cached entry without a value counts as a miss.
    pub async fn get_config(&self, key: &str) -> StoreResult<Option<ConfigEntry>> {
        if let Some(entry) = self.cache.get(key) {
            if entry.value.is_some() {
                return Ok(Some(entry));
            }
        }

        debug!(key, "cache miss; reading store");
        match self.store.find_by_key(key).await? {
            Some(entry) => {
                self.cache.put(entry.clone());
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Like `get_config`, but only returns entries whose refresh time is still ahead.
    ///
    /// Entries with `refresh_time == 0` are always treated as expired; read
    /// the app credentials with `get_config` instead.
    pub async fn get_config_with_expiry(&self, key: &str) -> StoreResult<Option<ConfigEntry>> {
        self.get_config_valid_at(key, now_millis()).await
    }

    /// `get_config_with_expiry` evaluated at `now_ms` instead of the wall clock.
    pub async fn get_config_valid_at(
        &self,
        key: &str,
        now_ms: i64,
    ) -> StoreResult<Option<ConfigEntry>> {
        Ok(self
            .get_config(key)
            .await?
            .filter(|entry| entry.is_valid_at(now_ms)))
    }

    /// Drop every cached entry; the store is untouched.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
