//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// Redis store for OTP state.
///
/// All keys live under the `catalog:` namespace. The `ConnectionManager`
/// reconnects on its own and is cheap to clone per call.
pub struct RedisCache {
    client: ConnectionManager,
    key_prefix: String,
}

const KEY_PREFIX: &str = "catalog:";

// KEEPTTL needs Redis 6.0 or newer.
const COMPARE_AND_SWAP: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2], 'KEEPTTL')
    return 1
end
return 0
";

impl RedisCache {
    /// Opens a managed connection and checks it with a PING before
    /// handing the cache out.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] for a malformed URL, a refused
    /// connection or a failed PING.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let manager = Client::open(redis_url)
            .map_err(|e| connection_error("open client", e))?
            .get_connection_manager()
            .await
            .map_err(|e| connection_error("connect", e))?;

        manager
            .clone()
            .ping::<()>()
            .await
            .map_err(|e| connection_error("PING", e))?;

        info!(prefix = KEY_PREFIX, "Redis connection established");
        Ok(Self {
            client: manager,
            key_prefix: KEY_PREFIX.to_string(),
        })
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

fn connection_error(stage: &str, e: redis::RedisError) -> CacheError {
    CacheError::ConnectionError(format!("Redis {stage} failed: {e}"))
}

fn operation_error(op: &str, e: redis::RedisError) -> CacheError {
    CacheError::OperationError(format!("Redis {} failed: {}", op, e))
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();
        let value: Option<String> = conn
            .get(self.build_key(key))
            .await
            .map_err(|e| operation_error("GET", e))?;

        debug!(key, hit = value.is_some(), "Cache GET");
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let seconds = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.build_key(key), value, seconds)
            .await
            .map_err(|e| operation_error("SETEX", e))?;

        debug!(key, ttl_seconds = seconds, "Cache SET");
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        replacement: &str,
    ) -> CacheResult<bool> {
        let mut conn = self.client.clone();
        let swapped: i64 = redis::cmd("EVAL")
            .arg(COMPARE_AND_SWAP)
            .arg(1)
            .arg(self.build_key(key))
            .arg(expected)
            .arg(replacement)
            .query_async(&mut conn)
            .await
            .map_err(|e| operation_error("EVAL", e))?;

        debug!(key, swapped = swapped == 1, "Cache CAS");
        Ok(swapped == 1)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
