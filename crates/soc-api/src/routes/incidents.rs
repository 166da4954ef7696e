//! Incident administration endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use soc_core::db::{create_incident_repository, create_user_repository, LifecycleUpdate};
use soc_core::{Incident, IncidentError, IncidentStatus, NewIncident};
use tracing::{info, warn};
use validator::Validate;

use crate::dto::StatusTransitionRequest;
use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiPath};
use crate::state::AppState;

/// Creates incident routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_incident))
        .route("/:id", get(get_incident))
        .route("/:id/status", patch(transition_incident))
}

/// Create an incident.
#[utoipa::path(
    post,
    path = "/api/incidents",
    request_body = NewIncident,
    responses(
        (status = 201, description = "Incident created", body = Incident),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Assignee not found"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Incidents"
)]
async fn create_incident(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewIncident>,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
    request.validate()?;
    request.check_invariants()?;

    if let Some(assignee) = request.assigned_to {
        let users = create_user_repository(&state.db);
        if users.get(assignee).await?.is_none() {
            return Err(ApiError::NotFound(format!("User {} not found", assignee)));
        }
    }

    let repo = create_incident_repository(&state.db);
    let incident = repo.create(&request).await?;
    info!(
        incident_id = incident.id,
        severity = %incident.severity,
        status = %incident.status,
        "Created incident"
    );

    Ok((StatusCode::CREATED, Json(incident)))
}

/// Get a single incident by ID.
#[utoipa::path(
    get,
    path = "/api/incidents/{id}",
    params(
        ("id" = i64, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Incident details", body = Incident),
        (status = 404, description = "Incident not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Incidents"
)]
async fn get_incident(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Incident>, ApiError> {
    let repo = create_incident_repository(&state.db);
    repo.get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Incident {} not found", id)))
}

/// Move an incident to a new status.
#[utoipa::path(
    patch,
    path = "/api/incidents/{id}/status",
    params(
        ("id" = i64, Path, description = "Incident ID")
    ),
    request_body = StatusTransitionRequest,
    responses(
        (status = 200, description = "Updated incident", body = Incident),
        (status = 404, description = "Incident not found"),
        (status = 409, description = "Transition not allowed"),
        (status = 422, description = "Unknown status"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Incidents"
)]
async fn transition_incident(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<StatusTransitionRequest>,
) -> Result<Json<Incident>, ApiError> {
    let target: IncidentStatus = request.status.parse()?;

    let repo = create_incident_repository(&state.db);
    let mut incident = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Incident {} not found", id)))?;

    let from = incident.status;
    incident.transition(target, Utc::now())?;
    let applied = repo
        .update_lifecycle(id, from, &LifecycleUpdate::from(&incident))
        .await?;

    if !applied {
        let current = repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Incident {} not found", id)))?;
        warn!(
            incident_id = id,
            expected = %from,
            actual = %current.status,
            "Incident status changed during update"
        );
        if !current.status.can_transition_to(target) {
            return Err(IncidentError::InvalidTransition {
                from: current.status,
                to: target,
            }
            .into());
        }
        return Err(ApiError::Conflict(format!(
            "Incident {} was modified concurrently",
            id
        )));
    }

    info!(incident_id = id, %from, to = %target, "Incident status changed");

    Ok(Json(incident))
}
