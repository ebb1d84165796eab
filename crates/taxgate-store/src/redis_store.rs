//! Redis storage.
//!
//! Each blob is a Redis string under `<prefix>:<key>`. Writes also add the
//! key to an index set so listing never needs `KEYS` or `SCAN`. Blobs carry
//! a retention TTL (one year by default).

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::error::{Result, StoreError};
use crate::KvStore;

/// Default key prefix.
pub const DEFAULT_PREFIX: &str = "taxgate";

/// Default retention: one year.
pub const DEFAULT_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Redis-backed `KvStore`.
#[derive(Clone, Debug)]
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
    ttl_secs: Option<u64>,
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Database(err.to_string())
    }
}

impl RedisStore {
    /// Create a store for the Redis server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a valid Redis connection string.
    pub fn new(url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(url.as_ref())?,
            prefix: DEFAULT_PREFIX.to_string(),
            ttl_secs: Some(DEFAULT_TTL_SECS),
        })
    }

    /// Use a different key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the retention TTL; `None` or zero keeps blobs forever.
    #[must_use]
    pub fn with_ttl(mut self, ttl_secs: Option<u64>) -> Self {
        self.ttl_secs = ttl_secs.filter(|ttl| *ttl > 0);
        self
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Check that the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: Option<Vec<u8>> = conn.get(format!("{}:__ping__", self.prefix)).await?;
        Ok(())
    }

    fn key_blob(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    fn key_index(&self) -> String {
        format!("{}:__keys__", self.prefix)
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(self.key_blob(key)).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.connection().await?;
        let blob_key = self.key_blob(key);

        let mut pipe = redis::pipe();
        pipe.atomic();
        match self.ttl_secs {
            Some(ttl) => {
                pipe.cmd("SET").arg(&blob_key).arg(value).arg("EX").arg(ttl);
            }
            None => {
                pipe.set(&blob_key, value);
            }
        }
        pipe.sadd(self.key_index(), key);

        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let members: Vec<String> = conn.smembers(self.key_index()).await?;

        let mut keys: Vec<String> = members
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed() {
        let store = RedisStore::new("redis://127.0.0.1:6379")
            .unwrap()
            .with_prefix("test");
        assert_eq!(store.key_blob("logs:2025-01"), "test:logs:2025-01");
        assert_eq!(store.key_index(), "test:__keys__");
    }

    #[test]
    fn zero_ttl_disables_expiry() {
        let store = RedisStore::new("redis://127.0.0.1:6379")
            .unwrap()
            .with_ttl(Some(0));
        assert_eq!(store.ttl_secs, None);
    }

    #[test]
    fn rejects_bad_url() {
        assert!(RedisStore::new("not a url").is_err());
    }
}
