//! HTTP request/response tracing middleware.

use axum::body::Body;
use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};

/// Span factory for [`layer`].
pub type MakeSpan = fn(&Request<Body>) -> Span;

/// Creates a tracing middleware for HTTP requests.
///
/// The span records method, path and HTTP version. The query string is left
/// out since filter values may carry personal data. Responses are logged at
/// `INFO` with status and latency in milliseconds.
///
/// # Example Logs
///
/// ```text
/// INFO request{method=POST path=/api/v1/colors/get-by-filter version=HTTP/1.1}: finished processing request latency=4 ms status=200
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeSpan> {
    TraceLayer::new_for_http()
        .make_span_with(make_span as MakeSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}
