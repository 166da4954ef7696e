//! Analytics endpoint integration tests.

use axum::http::StatusCode;
use serde_json::Value;
use soc_core::db::mocks::MockAnalyticsRepository;
use soc_core::db::{create_analyst_metrics_repository, DbPool};
use soc_core::{
    AnalystMetricsUpdate, AnalyticsService, IncidentStatus, NewIncident, Role, Severity,
};
use std::sync::Arc;

use super::common::{
    create_incident, create_test_router, create_user, get_request, send_request,
};
use soc_api::routes;

fn incident(title: &str, severity: Severity, detection_time: Option<i64>) -> NewIncident {
    NewIncident {
        detection_time,
        ..NewIncident::new(title, severity)
    }
}

#[tokio::test]
async fn test_overview_on_empty_database_is_zeroed() {
    let (app, _state) = create_test_router().await;

    let (status, body): (StatusCode, Value) =
        send_request(app, get_request("/api/analytics?type=overview")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalIncidents"], 0);
    assert_eq!(data["openIncidents"], 0);
    assert_eq!(data["closedIncidents"], 0);
    assert_eq!(data["averageMTTD"].as_f64(), Some(0.0));
    assert_eq!(data["averageMTTR"].as_f64(), Some(0.0));
    assert_eq!(data["criticalIncidents"], 0);
    assert!(body.get("degraded").is_none());
}

#[tokio::test]
async fn test_overview_counts_severity_and_mean_detection() {
    let (app, state) = create_test_router().await;
    create_incident(&state, incident("Ransomware signature found", Severity::Critical, Some(10))).await;
    create_incident(&state, incident("Phishing email detected", Severity::High, Some(20))).await;
    create_incident(&state, incident("DDoS attack in progress", Severity::Critical, None)).await;

    let (status, body): (StatusCode, Value) =
        send_request(app, get_request("/api/v1/analytics?type=overview")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalIncidents"], 3);
    assert_eq!(data["criticalIncidents"], 2);
    assert_eq!(data["averageMTTD"].as_f64(), Some(15.0));
    assert_eq!(data["openIncidents"], 3);
}

#[tokio::test]
async fn test_overview_ignores_unrecognised_status_in_buckets() {
    let (app, state) = create_test_router().await;
    create_incident(&state, NewIncident::new("Firewall rule violation", Severity::Low)).await;
    let closed = NewIncident {
        status: IncidentStatus::Closed,
        ..NewIncident::new("Failed backup detected", Severity::Medium)
    };
    create_incident(&state, closed).await;

    let DbPool::Sqlite(pool) = state.db.as_ref() else {
        panic!("integration tests run on SQLite");
    };
    sqlx::query(
        "INSERT INTO incidents (title, severity, status, detected_at, created_at) \
         VALUES ('Legacy import', 'low', 'archived', '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
    )
    .execute(pool)
    .await
    .unwrap();

    let (status, body): (StatusCode, Value) =
        send_request(app, get_request("/api/analytics?type=overview")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalIncidents"], 3);
    assert_eq!(data["openIncidents"], 1);
    assert_eq!(data["closedIncidents"], 1);
}

#[tokio::test]
async fn test_analyst_performance_defaults_and_filters() {
    let (app, state) = create_test_router().await;
    let admin = create_user(&state, "admin@soc.com", "Admin", Role::Admin).await;
    let alice = create_user(&state, "alice@soc.com", "Alice Johnson", Role::Analyst).await;
    let bob = create_user(&state, "bob@soc.com", "Bob Smith", Role::Analyst).await;

    create_analyst_metrics_repository(&state.db)
        .upsert(
            bob.id,
            &AnalystMetricsUpdate {
                incidents_handled: 38,
                avg_response_time: 28.0,
                success_rate: 88.0,
                skill_level: 3,
            },
        )
        .await
        .unwrap();
    let resolved = NewIncident {
        status: IncidentStatus::Resolved,
        assigned_to: Some(bob.id),
        ..NewIncident::new("SQL injection attempt", Severity::High)
    };
    create_incident(&state, resolved).await;

    let (status, body): (StatusCode, Value) = send_request(
        app.clone(),
        get_request("/api/analytics?type=analyst-performance"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], alice.id);
    assert_eq!(rows[0]["total_incidents"], 0);
    assert_eq!(rows[0]["incidents_closed"], 0);
    assert_eq!(rows[1]["analyst_name"], "Bob Smith");
    assert_eq!(rows[1]["total_incidents"], 38);
    assert_eq!(rows[1]["incidents_closed"], 1);
    assert_eq!(rows[1]["performance_score"].as_f64(), Some(88.0));

    let uri = format!("/api/analytics?type=analyst-performance&userId={}", bob.id);
    let (_, body): (StatusCode, Value) = send_request(app.clone(), get_request(&uri)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/analytics?type=analyst-performance&userId={}", admin.id);
    let (status, body): (StatusCode, Value) = send_request(app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recent_incidents_limit_and_order() {
    let (app, state) = create_test_router().await;
    let alice = create_user(&state, "alice@soc.com", "Alice Johnson", Role::Analyst).await;
    create_incident(&state, NewIncident::new("Unusual network traffic", Severity::Low)).await;
    create_incident(&state, NewIncident::new("Malware detected on endpoint", Severity::High)).await;
    let newest = NewIncident {
        assigned_to: Some(alice.id),
        ..NewIncident::new("Data exfiltration alert", Severity::Critical)
    };
    create_incident(&state, newest).await;

    let (status, body): (StatusCode, Value) = send_request(
        app.clone(),
        get_request("/api/analytics?type=recent-incidents&limit=2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["title"], "Data exfiltration alert");
    assert_eq!(rows[0]["assigned_to_name"], "Alice Johnson");
    assert_eq!(rows[1]["title"], "Malware detected on endpoint");
    assert!(rows[1]["assigned_to_name"].is_null());

    let (status, body): (StatusCode, Value) = send_request(
        app.clone(),
        get_request("/api/analytics?type=recent-incidents&limit=0"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body): (StatusCode, Value) =
        send_request(app, get_request("/api/analytics?type=recent-incidents")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_recent_incidents_rejects_bad_limits() {
    let (app, _state) = create_test_router().await;

    for uri in [
        "/api/analytics?type=recent-incidents&limit=101",
        "/api/analytics?type=recent-incidents&limit=-1",
        "/api/analytics?type=recent-incidents&limit=ten",
    ] {
        let (status, body): (StatusCode, Value) =
            send_request(app.clone(), get_request(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_training_records_report() {
    let (app, state) = create_test_router().await;
    let alice = create_user(&state, "alice@soc.com", "Alice Johnson", Role::Analyst).await;
    let bob = create_user(&state, "bob@soc.com", "Bob Smith", Role::Analyst).await;

    for (user_id, course) in [
        (alice.id, "GIAC Certified Incident Handler"),
        (bob.id, "Network Forensics"),
    ] {
        let body = format!(
            r#"{{"user_id":{},"course_name":"{}","status":"in_progress"}}"#,
            user_id, course
        );
        let (status, _): (StatusCode, Value) = send_request(
            app.clone(),
            super::common::post_json_request("/api/training", &body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body): (StatusCode, Value) =
        send_request(app.clone(), get_request("/api/analytics?type=training")).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["user_name"], "Alice Johnson");
    assert_eq!(rows[0]["status"], "in_progress");

    let uri = format!("/api/analytics?type=training&userId={}", bob.id);
    let (_, body): (StatusCode, Value) = send_request(app, get_request(&uri)).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["course_name"], "Network Forensics");
}

#[tokio::test]
async fn test_missing_or_unknown_type_is_bad_request() {
    let (app, _state) = create_test_router().await;

    for uri in ["/api/analytics", "/api/analytics?type=heatmap"] {
        let (status, body): (StatusCode, Value) =
            send_request(app.clone(), get_request(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid type parameter");
    }
}

#[tokio::test]
async fn test_storage_failure_is_generic_500() {
    let (_app, state) = create_test_router().await;
    let state = state.with_analytics(AnalyticsService::new(Arc::new(
        MockAnalyticsRepository::failing(),
    )));
    let app = routes::create_router(state);

    let (status, body): (StatusCode, Value) =
        send_request(app, get_request("/api/analytics?type=overview")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
    assert!(!body.to_string().contains("mock storage"));
}

#[tokio::test]
async fn test_storage_failure_degrades_when_enabled() {
    let (_app, state) = create_test_router().await;
    let state = state
        .with_analytics(AnalyticsService::new(Arc::new(
            MockAnalyticsRepository::failing(),
        )))
        .with_degraded_analytics(true);
    let app = routes::create_router(state);

    let (status, body): (StatusCode, Value) =
        send_request(app.clone(), get_request("/api/analytics?type=overview")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert_eq!(body["data"]["totalIncidents"], 0);

    let (status, body): (StatusCode, Value) =
        send_request(app, get_request("/api/analytics?type=analyst-performance")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert!(body["data"].as_array().unwrap().is_empty());
}
