//! Handler for the health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::BaseResponse;
use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

type HealthReply = (StatusCode, Json<BaseResponse<HealthResponse>>);

/// Returns service health with component checks.
///
/// # Endpoint
///
/// `GET /api/v1/health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Response
///
/// ```json
/// {
///   "data": {
///     "status": "healthy",
///     "version": "0.1.0",
///     "checks": {
///       "database": { "status": "ok", "message": "Connected" },
///       "cache": { "status": "ok", "message": "Cache reachable" }
///     }
///   },
///   "success": true
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> HealthReply {
    let database = check_database(&state).await;
    let cache = check_cache(&state).await;

    let healthy = database.is_ok() && cache.is_ok();
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks { database, cache },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = BaseResponse {
        data: response,
        success: healthy,
    };
    (status, Json(body))
}

async fn check_database(state: &AppState) -> CheckStatus {
    match sqlx::query("SELECT 1").execute(state.pool.as_ref()).await {
        Ok(_) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {e}")),
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Cache reachable")
    } else {
        CheckStatus::error("Cache unreachable")
    }
}
