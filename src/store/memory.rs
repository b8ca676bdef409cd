use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{ConfigStore, StoreResult};
use crate::model::ConfigEntry;

/// Process-local store. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: DashMap<String, ConfigEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn find_by_key(&self, key: &str) -> StoreResult<Option<ConfigEntry>> {
        Ok(self.rows.get(key).map(|r| r.clone()))
    }

    async fn create_if_absent(&self, entry: &ConfigEntry) -> StoreResult<bool> {
        match self.rows.entry(entry.key.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(v) => {
                v.insert(entry.clone());
                Ok(true)
            }
        }
    }

    async fn upsert(&self, entry: &ConfigEntry) -> StoreResult<()> {
        self.rows.insert(entry.key.clone(), entry.clone());
        Ok(())
    }
}
