//! Health check endpoint integration tests.

use axum::http::StatusCode;
use serde_json::Value;

use super::common::{create_test_router, get_request, send_request, send_request_raw};

#[tokio::test]
async fn test_health_endpoint_reports_database() {
    let (app, _state) = create_test_router().await;

    let (status, body): (StatusCode, Value) = send_request(app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["connected"], true);
    assert_eq!(body["database"]["db_type"], "sqlite");
}

#[tokio::test]
async fn test_probes_return_ok() {
    let (app, _state) = create_test_router().await;

    for uri in ["/live", "/ready", "/api/live", "/api/v1/ready"] {
        let (status, _) = send_request_raw(app.clone(), get_request(uri)).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_ready_fails_after_pool_close() {
    let (app, state) = create_test_router().await;
    state.db.close().await;

    let (status, _) = send_request_raw(app, get_request("/ready")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _state) = create_test_router().await;

    let (status, _) = send_request_raw(app, get_request("/api/heatmaps")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
