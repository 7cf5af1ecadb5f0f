//! Prometheus scrape endpoint.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Renders every recorded metric in the Prometheus text format.
///
/// # Endpoint
///
/// `GET /metrics`
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], handle.render())
}
