//! Cross-origin resource sharing.
//!
//! Applied outside every gate chain, so preflight requests are answered
//! without a token and without spending rate-limit budget.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, InvalidHeaderValue, RETRY_AFTER};
use axum::http::{HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Origin list entry that allows every origin.
pub const ANY_ORIGIN: &str = "*";

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(3600);

/// Builds the CORS layer for the configured origins.
///
/// `["*"]` allows any origin; otherwise only exact matches are echoed back.
///
/// # Errors
///
/// Returns an error if an origin is not a valid header value.
pub fn layer(origins: &[String]) -> Result<CorsLayer, InvalidHeaderValue> {
    let allow_origin = if origins.iter().any(|o| o == ANY_ORIGIN) {
        AllowOrigin::any()
    } else {
        let origins = origins
            .iter()
            .map(|o| HeaderValue::from_str(o))
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([RETRY_AFTER])
        .max_age(PREFLIGHT_MAX_AGE))
}
