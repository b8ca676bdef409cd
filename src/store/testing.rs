//! Store double used by the accessor and service tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ConfigStore, MemoryStore, StoreError, StoreResult};
use crate::model::ConfigEntry;

/// Wraps a `MemoryStore`, counts reads, and can be switched to fail every call.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
    failing: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("test store switched off".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConfigStore for CountingStore {
    async fn find_by_key(&self, key: &str) -> StoreResult<Option<ConfigEntry>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_by_key(key).await
    }

    async fn create_if_absent(&self, entry: &ConfigEntry) -> StoreResult<bool> {
        self.check()?;
        self.inner.create_if_absent(entry).await
    }

    async fn upsert(&self, entry: &ConfigEntry) -> StoreResult<()> {
        self.check()?;
        self.inner.upsert(entry).await
    }
}
