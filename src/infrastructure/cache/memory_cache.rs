//! In-process cache implementation.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Expiring map kept in process memory.
///
/// Selected when no Redis URL is configured. State is lost on restart and is
/// not shared between replicas, which is fine for development and tests.
/// Expired entries are dropped lazily on access and on every write.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        debug!("Using in-process cache");
        Self::default()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        replacement: &str,
    ) -> CacheResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some((value, expires_at)) if *expires_at > now && value == expected => {
                *value = replacement.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new();
        cache
            .set_ex("otp:09120000000", "abc", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get("otp:09120000000").await.unwrap(),
            Some("abc".to_string())
        );
        assert!(cache.get("otp:other").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = MemoryCache::new();
        cache
            .set_ex("key", "value", Duration::from_secs(2))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("key").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("key").await.unwrap().is_none());
        assert!(!cache.compare_and_swap("key", "value", "other").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_compare_and_swap_keeps_expiry() {
        let cache = MemoryCache::new();
        cache
            .set_ex("key", "one", Duration::from_secs(10))
            .await
            .unwrap();

        assert!(!cache.compare_and_swap("key", "stale", "two").await.unwrap());
        assert!(cache.compare_and_swap("key", "one", "two").await.unwrap());
        assert_eq!(cache.get("key").await.unwrap(), Some("two".to_string()));
        assert!(!cache.compare_and_swap("key", "one", "three").await.unwrap());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.get("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_value() {
        let cache = MemoryCache::new();
        cache.set_ex("key", "one", Duration::from_secs(60)).await.unwrap();
        cache.set_ex("key", "two", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("key").await.unwrap(), Some("two".to_string()));
    }
}
