//! Top-level router.
//!
//! # Route Structure
//!
//! - `/api/v1/*` - REST API, see [`crate::api::routes`]
//! - `/metrics` - Prometheus scrape endpoint
//!
//! # Middleware
//!
//! - **CORS** - outermost, so preflights skip every gate
//! - **Tracing** - structured request/response logging
//! - **Global rate limit** - per-client token bucket over the whole `/api` tree
//! - **Gate chains** - per route: authentication, authorization, OTP limiter
//! - **Path normalization** - trailing slash handling

use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api;
use crate::api::handlers::metrics_handler;
use crate::api::middleware::{Limiters, tracing};
use crate::state::AppState;

/// Routes and router-wide layers, without path normalization.
///
/// `limiters` are shared with the pruning tasks, so the router only holds
/// references to them.
pub fn router(state: AppState, limiters: &Limiters, cors: CorsLayer) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .nest(
            "/api",
            api::routes::api_routes(state.tokens.clone(), limiters),
        )
        .with_state(state)
        .layer(tracing::layer())
        .layer(cors)
}

/// Builds the application router.
pub fn app_router(state: AppState, limiters: &Limiters, cors: CorsLayer) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, limiters, cors))
}
