//! Per-client rate limiting gate using the GCRA token bucket.

use async_trait::async_trait;
use axum::http::request::Parts;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::chain::Gate;
use crate::error::AppError;
use crate::utils::client_ip::client_key;

/// Keyed token-bucket limiter.
///
/// Each client key gets its own bucket, created on first sight with full
/// burst capacity. Check-and-decrement is a single atomic compare-and-swap
/// per key, so concurrent requests from one client can never both take the
/// last token; a denied request consumes nothing.
///
/// Buckets of idle clients are dropped by [`Self::prune`], which
/// [`spawn_pruner`] runs periodically.
pub struct ClientRateLimiter {
    name: &'static str,
    error_code: &'static str,
    limiter: DefaultKeyedRateLimiter<String>,
}

impl ClientRateLimiter {
    /// # Arguments
    ///
    /// - `name` - gate label for logs and metrics
    /// - `error_code` - `errorCode` sent with 429 responses
    /// - `quota` - refill rate and burst capacity per client
    pub fn new(name: &'static str, error_code: &'static str, quota: Quota) -> Self {
        Self {
            name,
            error_code,
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// One permit per `interval`, at most `burst` saved up.
    ///
    /// Returns `None` for a zero interval.
    pub fn quota(interval: Duration, burst: NonZeroU32) -> Option<Quota> {
        Quota::with_period(interval).map(|q| q.allow_burst(burst))
    }

    /// Takes one permit for `key`.
    ///
    /// # Errors
    ///
    /// Returns how long the client must wait for the next permit.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.limiter
            .check_key(&key.to_string())
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    /// Drops buckets that have refilled completely; they are equivalent to
    /// a fresh bucket, so pruning never changes a decision.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of client keys currently holding a bucket.
    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Runs [`ClientRateLimiter::prune`] every `every` until the task is aborted.
pub fn spawn_pruner(limiter: Arc<ClientRateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let before = limiter.tracked_keys();
            limiter.prune();
            debug!(
                limiter = limiter.name(),
                before,
                after = limiter.tracked_keys(),
                "Pruned idle rate limit buckets"
            );
        }
    })
}

/// The two limiters the router needs: one across the whole API, one in
/// front of OTP issuance.
#[derive(Clone)]
pub struct Limiters {
    pub global: Arc<ClientRateLimiter>,
    pub otp: Arc<ClientRateLimiter>,
    pub behind_proxy: bool,
}

impl Limiters {
    pub fn new(global: Quota, otp: Quota, behind_proxy: bool) -> Self {
        Self {
            global: Arc::new(ClientRateLimiter::new("global", "rate_limited", global)),
            otp: Arc::new(ClientRateLimiter::new("otp", "otp_rate_limited", otp)),
            behind_proxy,
        }
    }

    pub fn global_gate(&self) -> RateLimitGate {
        RateLimitGate::new(Arc::clone(&self.global), self.behind_proxy)
    }

    pub fn otp_gate(&self) -> RateLimitGate {
        RateLimitGate::new(Arc::clone(&self.otp), self.behind_proxy)
    }

    pub fn spawn_pruners(&self, every: Duration) -> Vec<JoinHandle<()>> {
        vec![
            spawn_pruner(Arc::clone(&self.global), every),
            spawn_pruner(Arc::clone(&self.otp), every),
        ]
    }
}

/// Gate rejecting clients that exceed their limiter quota with 429.
///
/// The client key is the caller's IP; see [`client_key`].
pub struct RateLimitGate {
    limiter: Arc<ClientRateLimiter>,
    behind_proxy: bool,
}

impl RateLimitGate {
    pub fn new(limiter: Arc<ClientRateLimiter>, behind_proxy: bool) -> Self {
        Self {
            limiter,
            behind_proxy,
        }
    }
}

#[async_trait]
impl Gate for RateLimitGate {
    fn name(&self) -> &'static str {
        self.limiter.name
    }

    async fn admit(&self, parts: &mut Parts) -> Result<(), AppError> {
        let key = client_key(parts, self.behind_proxy);

        self.limiter.check(&key).map_err(|wait| {
            warn!(limiter = self.limiter.name, client = %key, "Rate limit exceeded");
            AppError::too_many_requests(
                self.limiter.error_code,
                "Too many requests, please try again later",
                Some(wait),
            )
        })
    }
}
