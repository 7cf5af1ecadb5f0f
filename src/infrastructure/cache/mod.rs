//! Short-lived key-value state (OTP codes).
//!
//! Provides a [`CacheService`] trait with two implementations:
//! - [`RedisCache`] - Redis-backed store, shared across replicas
//! - [`MemoryCache`] - in-process store used when Redis is not configured

mod memory_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};

#[cfg(test)]
pub use service::MockCacheService;
