//! HTTP server initialization and runtime setup.
//!
//! Connects the store and the OTP cache, wires services, spawns the limiter
//! pruners and runs Axum until a shutdown signal arrives.

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::api::middleware::{ClientRateLimiter, Limiters, cors};
use crate::application::services::{
    LogOtpSender, OtpService, OtpSettings, ResourceMapping, ResourceService, TokenService,
    UserService,
};
use crate::config::Config;
use crate::infrastructure::cache::{CacheService, MemoryCache, RedisCache};
use crate::infrastructure::persistence::{PgResourceRepository, PgUserRepository};
use crate::routes::app_router;
use crate::state::AppState;

const DB_CONNECT_ATTEMPTS: usize = 5;

/// Opens the connection pool, retrying with exponential backoff.
///
/// # Errors
///
/// Returns the last connection error once every attempt has failed.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let options = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime));

    let strategy = ExponentialBackoff::from_millis(200)
        .factor(2)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(DB_CONNECT_ATTEMPTS);

    let url = config.database_url.clone();
    let pool = Retry::spawn(strategy, || {
        let options = options.clone();
        let url = url.clone();
        async move {
            options.connect(&url).await.inspect_err(|e| {
                tracing::warn!(error = %e, "Database connection attempt failed");
            })
        }
    })
    .await
    .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// OTP cache backend: Redis when configured, otherwise in-process.
///
/// # Errors
///
/// A configured but unreachable Redis is fatal.
async fn connect_cache(config: &Config) -> Result<Arc<dyn CacheService>> {
    match &config.redis_url {
        Some(redis_url) => {
            let redis = RedisCache::connect(redis_url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("OTP store: Redis");
            Ok(Arc::new(redis))
        }
        None => {
            tracing::info!("OTP store: in-process cache");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

fn pg_resource<M: ResourceMapping>(pool: &Arc<PgPool>) -> ResourceService<M> {
    ResourceService::new(Arc::new(PgResourceRepository::<M::Entity>::new(
        Arc::clone(pool),
    )))
}

/// Installs the global Prometheus recorder.
///
/// If another recorder is already installed, falls back to a detached one so
/// `/metrics` still answers, though without the counters recorded elsewhere.
pub fn install_metrics_recorder() -> PrometheusHandle {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder, using a detached one");
            PrometheusBuilder::new().build_recorder().handle()
        }
    }
}

/// Wires repositories and services over an open pool and cache.
pub fn build_state(
    config: &Config,
    pool: Arc<PgPool>,
    cache: Arc<dyn CacheService>,
    metrics: PrometheusHandle,
) -> AppState {
    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.access_token_ttl(),
        config.refresh_token_ttl(),
    ));

    let otp = Arc::new(OtpService::new(
        Arc::clone(&cache),
        Arc::new(LogOtpSender),
        &config.jwt_secret,
        OtpSettings {
            digits: config.otp_digits,
            lifetime: config.otp_lifetime(),
        },
    ));

    let users = Arc::new(UserService::new(
        Arc::new(PgUserRepository::new(Arc::clone(&pool))),
        otp,
        Arc::clone(&tokens),
    ));

    AppState {
        colors: pg_resource(&pool),
        property_categories: pg_resource(&pool),
        properties: pg_resource(&pool),
        car_types: pg_resource(&pool),
        car_models: pg_resource(&pool),
        pool,
        cache,
        users,
        tokens,
        metrics,
    }
}

/// Builds the global and OTP limiters from configuration.
///
/// # Errors
///
/// Returns an error for a zero burst or interval.
pub fn build_limiters(config: &Config) -> Result<Limiters> {
    let burst = NonZeroU32::new(config.rate_limit_burst).context("RATE_LIMIT_BURST must be > 0")?;
    let global = ClientRateLimiter::quota(config.rate_limit_interval(), burst)
        .context("RATE_LIMIT_PER_SECOND must be > 0")?;
    let otp = ClientRateLimiter::quota(config.otp_limiter_interval(), NonZeroU32::MIN)
        .context("OTP_LIMITER_SECONDS must be > 0")?;

    Ok(Limiters::new(global, otp, config.behind_proxy))
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if the store stays unreachable after retries, a
/// configured Redis is unreachable, or binding the listener fails.
pub async fn run(config: Config) -> Result<()> {
    let pool = Arc::new(connect_database(&config).await?);
    let cache = connect_cache(&config).await?;

    let limiters = build_limiters(&config)?;
    let pruners = limiters.spawn_pruners(config.limiter_prune_interval());

    let metrics = install_metrics_recorder();
    let cors = cors::layer(&config.cors_allowed_origins)
        .context("CORS_ALLOWED_ORIGINS contains an invalid origin")?;

    let state = build_state(&config, pool, cache, metrics);
    let app = app_router(state, &limiters, cors);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    for pruner in pruners {
        pruner.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
