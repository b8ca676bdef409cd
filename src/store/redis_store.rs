//! Redis-backed `ConfigStore`.
//!
//! Each entry is stored as a JSON document under `<namespace>:<key>`:
//!
//! ```text
//! wechat:config:access_token -> {"key":"access_token","value":"...","refresh_time":1700000000000}
//! ```
//!
//! No Redis TTL is set. Expiry is decided by the accessor at read time from
//! `refresh_time`, so an expired token stays readable until it is replaced.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use tracing::{debug, instrument};

use super::{ConfigStore, StoreError, StoreResult};
use crate::model::ConfigEntry;

pub const DEFAULT_NAMESPACE: &str = "wechat:config";

/// Stores entries in Redis through a shared `ConnectionManager`
#[derive(Clone)]
pub struct RedisStore {
    /// Redis connection manager (async, reconnecting)
    redis: ConnectionManager,
    /// Key prefix, e.g. "wechat:config"
    namespace: String,
}

impl RedisStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Open a connection manager for `redis_url`.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let cm = ConnectionManager::new(client).await?;
        Ok(Self::new(cm))
    }

    /// Override the key namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    fn entry_key(&self, key: &str) -> String {
        entry_key(&self.namespace, key)
    }
}

fn entry_key(namespace: &str, key: &str) -> String {
    format!("{}:{}", namespace, key)
}

#[async_trait]
impl ConfigStore for RedisStore {
    #[instrument(level = "debug", skip(self))]
    async fn find_by_key(&self, key: &str) -> StoreResult<Option<ConfigEntry>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(self.entry_key(key)).await?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    #[instrument(level = "debug", skip(self, entry), fields(key = %entry.key))]
    async fn create_if_absent(&self, entry: &ConfigEntry) -> StoreResult<bool> {
        let mut conn = self.redis.clone();
        let json = serde_json::to_string(entry)?;

        // SET key json NX: reply is OK when written, nil when the key exists
        let written: RedisResult<Option<String>> = redis::cmd("SET")
            .arg(self.entry_key(&entry.key))
            .arg(json)
            .arg("NX")
            .query_async(&mut conn)
            .await;

        match written {
            Ok(Some(_)) => Ok(true),
            Ok(None) => {
                debug!("entry already present; create skipped");
                Ok(false)
            }
            Err(e) => Err(StoreError::Redis(e)),
        }
    }

    #[instrument(level = "debug", skip(self, entry), fields(key = %entry.key))]
    async fn upsert(&self, entry: &ConfigEntry) -> StoreResult<()> {
        let mut conn = self.redis.clone();
        let json = serde_json::to_string(entry)?;
        let _: () = conn.set(self.entry_key(&entry.key), json).await?;
        Ok(())
    }
}
