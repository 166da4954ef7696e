//! Preferences endpoint integration tests.

use axum::http::StatusCode;
use serde_json::{json, Value};
use soc_core::Role;

use super::common::{
    create_test_router, create_user, get_request, post_json_request, send_request,
};

#[tokio::test]
async fn test_get_returns_defaults_without_persisting() {
    let (app, state) = create_test_router().await;
    let user = create_user(&state, "dana@soc.com", "Dana", Role::User).await;
    let uri = format!("/api/preferences?userId={}", user.id);

    let (status, body): (StatusCode, Value) = send_request(app, get_request(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    let prefs = &body["preferences"];
    assert_eq!(prefs["user_id"], user.id);
    assert_eq!(
        prefs["visible_widgets"],
        json!(["metrics", "systemHealth", "alerts"])
    );
    assert_eq!(prefs["dashboard_layout"], json!([]));
    assert_eq!(prefs["theme"], "dark");
    assert_eq!(prefs["refresh_interval"], 3000);
    assert!(prefs["updated_at"].is_null());

    let stored = soc_core::db::create_preferences_repository(&state.db)
        .get(user.id)
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_save_then_read_back() {
    let (app, state) = create_test_router().await;
    let user = create_user(&state, "dana@soc.com", "Dana", Role::User).await;

    let body = json!({
        "userId": user.id,
        "preferences": {
            "visible_widgets": ["metrics", "alerts"],
            "dashboard_layout": [{"i": "metrics", "x": 0, "y": 0, "w": 12, "h": 4, "minW": 6}],
            "theme": "light",
            "refresh_interval": 5000
        }
    });
    let (status, saved): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/preferences", &body.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["success"], true);
    assert_eq!(saved["message"], "Preferences saved successfully");

    let uri = format!("/api/preferences?userId={}", user.id);
    let (_, body): (StatusCode, Value) = send_request(app, get_request(&uri)).await;
    let prefs = &body["preferences"];
    assert_eq!(prefs["visible_widgets"], json!(["metrics", "alerts"]));
    assert_eq!(prefs["dashboard_layout"][0]["minW"], 6);
    assert_eq!(prefs["theme"], "light");
    assert_eq!(prefs["refresh_interval"], 5000);
    assert!(prefs["updated_at"].is_string());
}

#[tokio::test]
async fn test_partial_save_keeps_other_fields() {
    let (app, state) = create_test_router().await;
    let user = create_user(&state, "dana@soc.com", "Dana", Role::User).await;

    let first = json!({"userId": user.id, "preferences": {"theme": "light"}});
    let second = json!({"userId": user.id, "preferences": {"refresh_interval": 10000}});
    for body in [first, second] {
        let (status, _): (StatusCode, Value) = send_request(
            app.clone(),
            post_json_request("/api/preferences", &body.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let uri = format!("/api/preferences?userId={}", user.id);
    let (_, body): (StatusCode, Value) = send_request(app, get_request(&uri)).await;
    assert_eq!(body["preferences"]["theme"], "light");
    assert_eq!(body["preferences"]["refresh_interval"], 10000);
    assert_eq!(
        body["preferences"]["visible_widgets"],
        json!(["metrics", "systemHealth", "alerts"])
    );
}

#[tokio::test]
async fn test_missing_user_id_is_bad_request() {
    let (app, _state) = create_test_router().await;

    let (status, body): (StatusCode, Value) =
        send_request(app.clone(), get_request("/api/preferences")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User ID is required");

    let (status, body): (StatusCode, Value) = send_request(
        app,
        post_json_request("/api/preferences", r#"{"preferences":{"theme":"dark"}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User ID is required");
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let (app, _state) = create_test_router().await;

    let (status, _): (StatusCode, Value) =
        send_request(app.clone(), get_request("/api/preferences?userId=999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _): (StatusCode, Value) = send_request(
        app,
        post_json_request("/api/preferences", r#"{"userId":999,"preferences":{}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_preferences_are_rejected() {
    let (app, state) = create_test_router().await;
    let user = create_user(&state, "dana@soc.com", "Dana", Role::User).await;

    let unknown_widget = json!({"userId": user.id, "preferences": {"visible_widgets": ["clock"]}});
    let (status, _): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/preferences", &unknown_widget.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_fast = json!({"userId": user.id, "preferences": {"refresh_interval": 10}});
    let (status, body): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/preferences", &too_fast.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["refresh_interval"].is_array());

    let (status, _): (StatusCode, Value) = send_request(
        app,
        post_json_request("/api/preferences", "{not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
