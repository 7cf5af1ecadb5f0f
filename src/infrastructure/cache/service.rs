//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value store with per-entry expiry, holding short-lived OTP state.
///
/// Unlike a read-through cache, this store is the authority for the state it
/// holds, so implementations propagate failures instead of swallowing them.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed store
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process store for single-node and test setups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OperationError`] if the backend fails.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value, and expires
    /// it after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OperationError`] if the backend fails.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Atomically replaces the value under `key` with `replacement` if it
    /// currently equals `expected`. The entry keeps its remaining lifetime.
    ///
    /// Returns `false` when the key is absent, expired or holds another value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OperationError`] if the backend fails.
    async fn compare_and_swap(&self, key: &str, expected: &str, replacement: &str)
        -> CacheResult<bool>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by the health endpoint to report cache status.
    async fn health_check(&self) -> bool;
}

impl From<CacheError> for crate::error::AppError {
    fn from(e: CacheError) -> Self {
        crate::error::AppError::internal("Cache error", serde_json::json!({ "reason": e.to_string() }))
    }
}
