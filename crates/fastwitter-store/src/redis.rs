//! Redis cache implementation using `deadpool-redis`.

use std::time::Duration;

use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};

use crate::{Cache, StoreError};

/// A [`Cache`] backed by Redis.
///
/// Connections come from a bounded pool: a request that finds every
/// connection busy waits for one to be returned.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// Builds a pool of at most `max_connections` connections to `url`.
    ///
    /// Connections are opened lazily, so this succeeds even when Redis
    /// is down. Use [`RedisCache::ping`] to check reachability.
    pub fn connect(
        url: &str,
        max_connections: usize,
    ) -> Result<Self, StoreError> {
        let mut cfg = Config::from_url(url);
        cfg.pool = Some(PoolConfig::new(max_connections));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::info!(max_connections, "Redis pool created");
        Ok(Self { pool })
    }

    /// Round-trips a `PING` on one pooled connection.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let _: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Closes the pool. Connections in use are dropped when returned.
    pub fn close(&self) {
        self.pool.close();
        tracing::info!("Redis pool closed");
    }
}

impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.pool.get().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let () = conn.set(key, value).await?;
        Ok(())
    }

    async fn set_ex(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        // SETEX rejects 0; a sub-second TTL rounds up to one second.
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.pool.get().await?;
        let () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let () = conn.del(key).await?;
        Ok(())
    }
}
