//! Common test utilities for integration tests.

use axum::{
    body::Body,
    http::{Method, StatusCode},
    Router,
};
use serde::de::DeserializeOwned;
use soc_api::{routes, AppState};
use soc_core::db::{
    create_incident_repository, create_pool_with_options, create_user_repository,
    run_migrations, DbPool, PoolOptions,
};
use soc_core::{Incident, NewIncident, NewUser, Role, User};
use tower::ServiceExt;
use uuid::Uuid;

/// Creates an isolated in-memory SQLite database with migrations applied.
pub async fn setup_test_db() -> DbPool {
    let db_url = format!(
        "sqlite:file:integration_test_{}?mode=memory&cache=shared",
        Uuid::new_v4()
    );

    let pool = create_pool_with_options(&db_url, PoolOptions::single_connection())
        .await
        .expect("Failed to create SQLite pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

/// Creates an AppState with a test database.
pub async fn create_test_state() -> AppState {
    AppState::new(setup_test_db().await)
}

/// Creates a test router over a fresh database.
pub async fn create_test_router() -> (Router, AppState) {
    let state = create_test_state().await;
    let router = routes::create_router(state.clone());
    (router, state)
}

/// Inserts a user directly through the repository.
pub async fn create_user(state: &AppState, email: &str, name: &str, role: Role) -> User {
    create_user_repository(&state.db)
        .create(&NewUser::new(email, name, role))
        .await
        .expect("Failed to create user")
}

/// Inserts an incident directly through the repository.
pub async fn create_incident(state: &AppState, incident: NewIncident) -> Incident {
    create_incident_repository(&state.db)
        .create(&incident)
        .await
        .expect("Failed to create incident")
}

/// Helper to make GET requests.
pub fn get_request(uri: &str) -> axum::extract::Request<Body> {
    axum::extract::Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to make requests with a JSON body.
pub fn json_request(method: Method, uri: &str, body: &str) -> axum::extract::Request<Body> {
    axum::extract::Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Helper to make POST requests with JSON body.
pub fn post_json_request(uri: &str, body: &str) -> axum::extract::Request<Body> {
    json_request(Method::POST, uri, body)
}

/// Sends request and parses JSON response.
pub async fn send_request<T: DeserializeOwned>(
    app: Router,
    request: axum::extract::Request<Body>,
) -> (StatusCode, T) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: T = serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "Failed to parse response: {} - Body: {:?}",
            e,
            String::from_utf8_lossy(&body)
        )
    });
    (status, parsed)
}

/// Sends request and returns raw response body.
pub async fn send_request_raw(
    app: Router,
    request: axum::extract::Request<Body>,
) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body).to_string())
}
