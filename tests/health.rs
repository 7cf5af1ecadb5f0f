mod common;

use axum::http::StatusCode;
use serde_json::Value;

use common::spawn_app;

#[tokio::test]
async fn test_health_is_public_and_reports_each_dependency() {
    let app = spawn_app();

    let response = app.server.get("/api/v1/health").await;

    // The test pool points at a closed port.
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["checks"]["database"]["status"], "error");
    assert_eq!(body["data"]["checks"]["cache"]["status"], "ok");
}
