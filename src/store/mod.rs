//! Durable storage for `ConfigEntry` records.
//!
//! The store is the source of truth behind the in-process cache. Two
//! backends are provided:
//! - `MemoryStore`: a process-local map, for tests and single-shot runs
//! - `RedisStore`: one JSON document per key in Redis
//!
//! Backends never retry; failures surface as `StoreError` and propagate to
//! the caller.

mod memory;
mod redis_store;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use redis_store::{DEFAULT_NAMESPACE, RedisStore};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::ConfigEntry;

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key/value CRUD over `ConfigEntry`
#[async_trait]
pub trait ConfigStore: Send + Sync + 'static {
    /// Point lookup by key.
    async fn find_by_key(&self, key: &str) -> StoreResult<Option<ConfigEntry>>;

    /// Insert `entry` only when nothing is stored under its key.
    ///
    /// Returns `true` when the entry was inserted.
    async fn create_if_absent(&self, entry: &ConfigEntry) -> StoreResult<bool>;

    /// Insert or replace the entry stored under its key.
    async fn upsert(&self, entry: &ConfigEntry) -> StoreResult<()>;
}
