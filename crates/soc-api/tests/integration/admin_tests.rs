//! Integration tests for the user, incident, analyst and training endpoints.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use soc_core::{NewIncident, Role, Severity};

use super::common::{
    create_incident, create_test_router, create_user, get_request, json_request,
    post_json_request, send_request,
};

#[tokio::test]
async fn test_create_and_list_users() {
    let (app, _state) = create_test_router().await;

    let body = json!({"email": "alice@soc.com", "name": "Alice Johnson", "role": "analyst"});
    let (status, user): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/users", &body.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "analyst");

    let (status, err): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/users", &body.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "CONFLICT");

    let admin = json!({"email": "root@soc.com", "name": "Root", "role": "admin"});
    send_request::<Value>(app.clone(), post_json_request("/api/users", &admin.to_string())).await;

    let (status, users): (StatusCode, Value) =
        send_request(app.clone(), get_request("/api/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (_, analysts): (StatusCode, Value) =
        send_request(app, get_request("/api/users?role=analyst")).await;
    let analysts = analysts.as_array().unwrap();
    assert_eq!(analysts.len(), 1);
    assert_eq!(analysts[0]["email"], "alice@soc.com");
}

#[tokio::test]
async fn test_create_user_validation() {
    let (app, _state) = create_test_router().await;

    let body = json!({"email": "not-an-email", "name": ""});
    let (status, err): (StatusCode, Value) =
        send_request(app, post_json_request("/api/users", &body.to_string())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["details"]["email"].is_array());
    assert!(err["details"]["name"].is_array());
}

#[tokio::test]
async fn test_create_incident_checks_invariants() {
    let (app, state) = create_test_router().await;
    let alice = create_user(&state, "alice@soc.com", "Alice Johnson", Role::Analyst).await;

    let ok = json!({
        "title": "Privilege escalation attempt",
        "severity": "high",
        "assigned_to": alice.id,
        "detection_time": 42
    });
    let (status, incident): (StatusCode, Value) =
        send_request(app.clone(), post_json_request("/api/incidents", &ok.to_string())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(incident["status"], "open");
    assert_eq!(incident["detection_time"], 42);

    let response_without_responded = json!({
        "title": "Brute force attack detected",
        "severity": "medium",
        "response_time": 15
    });
    let (status, _): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/incidents", &response_without_responded.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let resolution_on_open = json!({
        "title": "Brute force attack detected",
        "severity": "medium",
        "resolution_time": 60
    });
    let (status, _): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/incidents", &resolution_on_open.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let negative = json!({"title": "Bad", "severity": "low", "detection_time": -5});
    let (status, _): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/incidents", &negative.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let unknown_status = json!({"title": "Bad", "severity": "low", "status": "triaged"});
    let (status, _): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/incidents", &unknown_status.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown_assignee = json!({"title": "Orphan", "severity": "low", "assigned_to": 999});
    let (status, _): (StatusCode, Value) = send_request(
        app,
        post_json_request("/api/incidents", &unknown_assignee.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_transitions() {
    let (app, state) = create_test_router().await;
    let incident = create_incident(
        &state,
        NewIncident::new("Malware detected on endpoint", Severity::Critical),
    )
    .await;
    let uri = format!("/api/incidents/{}/status", incident.id);

    let (status, body): (StatusCode, Value) = send_request(
        app.clone(),
        json_request(Method::PATCH, &uri, r#"{"status":"investigating"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "investigating");
    assert!(body["responded_at"].is_string());
    assert!(body["response_time"].is_number());
    assert!(body["resolved_at"].is_null());

    let (status, body): (StatusCode, Value) = send_request(
        app.clone(),
        json_request(Method::PATCH, &uri, r#"{"status":"closed"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["resolved_at"].is_string());
    assert!(body["resolution_time"].is_number());

    let (status, body): (StatusCode, Value) = send_request(
        app.clone(),
        json_request(Method::PATCH, &uri, r#"{"status":"open"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _): (StatusCode, Value) = send_request(
        app.clone(),
        json_request(Method::PATCH, &uri, r#"{"status":"archived"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, stored): (StatusCode, Value) = send_request(
        app.clone(),
        get_request(&format!("/api/incidents/{}", incident.id)),
    )
    .await;
    assert_eq!(stored["status"], "closed");

    let (status, _): (StatusCode, Value) = send_request(
        app,
        json_request(Method::PATCH, "/api/incidents/999/status", r#"{"status":"closed"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analyst_metrics_upsert() {
    let (app, state) = create_test_router().await;
    let admin = create_user(&state, "root@soc.com", "Root", Role::Admin).await;
    let alice = create_user(&state, "alice@soc.com", "Alice Johnson", Role::Analyst).await;
    let uri = format!("/api/analysts/{}/metrics", alice.id);

    let (status, _): (StatusCode, Value) = send_request(app.clone(), get_request(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let metrics = json!({
        "incidents_handled": 45,
        "avg_response_time": 22.0,
        "success_rate": 92.0,
        "skill_level": 4
    });
    let (status, body): (StatusCode, Value) = send_request(
        app.clone(),
        json_request(Method::PUT, &uri, &metrics.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["incidents_handled"], 45);

    let updated = json!({
        "incidents_handled": 46,
        "avg_response_time": 21.5,
        "success_rate": 93.0,
        "skill_level": 4
    });
    send_request::<Value>(
        app.clone(),
        json_request(Method::PUT, &uri, &updated.to_string()),
    )
    .await;
    let (_, body): (StatusCode, Value) = send_request(app.clone(), get_request(&uri)).await;
    assert_eq!(body["incidents_handled"], 46);

    let out_of_range = json!({
        "incidents_handled": 1,
        "avg_response_time": 1.0,
        "success_rate": 150.0,
        "skill_level": 9
    });
    let (status, _): (StatusCode, Value) = send_request(
        app.clone(),
        json_request(Method::PUT, &uri, &out_of_range.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let admin_uri = format!("/api/analysts/{}/metrics", admin.id);
    let (status, _): (StatusCode, Value) = send_request(
        app,
        json_request(Method::PUT, &admin_uri, &metrics.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_training_record_validation() {
    let (app, state) = create_test_router().await;
    let alice = create_user(&state, "alice@soc.com", "Alice Johnson", Role::Analyst).await;

    let bad_score = json!({
        "user_id": alice.id,
        "course_name": "Threat Hunting",
        "status": "completed",
        "score": 120
    });
    let (status, _): (StatusCode, Value) = send_request(
        app.clone(),
        post_json_request("/api/training", &bad_score.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let unknown_user = json!({"user_id": 999, "course_name": "Threat Hunting", "status": "expired"});
    let (status, _): (StatusCode, Value) = send_request(
        app,
        post_json_request("/api/training", &unknown_user.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
