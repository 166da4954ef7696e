//! Analyst metric snapshot endpoints.

use axum::{extract::State, routing::get, Json, Router};
use soc_core::db::{create_analyst_metrics_repository, create_user_repository};
use soc_core::{AnalystMetrics, AnalystMetricsUpdate};
use tracing::info;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiPath};
use crate::state::AppState;

/// Creates analyst routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/:id/metrics", get(get_metrics).put(update_metrics))
}

/// Get an analyst's stored metrics snapshot.
#[utoipa::path(
    get,
    path = "/api/analysts/{id}/metrics",
    params(
        ("id" = i64, Path, description = "Analyst user ID")
    ),
    responses(
        (status = 200, description = "Metrics snapshot", body = AnalystMetrics),
        (status = 404, description = "No snapshot for this user"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Analysts"
)]
async fn get_metrics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<AnalystMetrics>, ApiError> {
    let repo = create_analyst_metrics_repository(&state.db);
    repo.get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No metrics recorded for user {}", id)))
}

/// Overwrite an analyst's metrics snapshot.
///
/// The snapshot is independent of the live incident counts.
#[utoipa::path(
    put,
    path = "/api/analysts/{id}/metrics",
    params(
        ("id" = i64, Path, description = "Analyst user ID")
    ),
    request_body = AnalystMetricsUpdate,
    responses(
        (status = 200, description = "Stored snapshot", body = AnalystMetrics),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation error or user is an admin"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Analysts"
)]
async fn update_metrics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<AnalystMetricsUpdate>,
) -> Result<Json<AnalystMetrics>, ApiError> {
    request.validate()?;

    let users = create_user_repository(&state.db);
    let user = users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;
    if !user.role.is_analyst() {
        return Err(ApiError::UnprocessableEntity(format!(
            "User {} is an admin and has no analyst metrics",
            id
        )));
    }

    let repo = create_analyst_metrics_repository(&state.db);
    let metrics = repo.upsert(id, &request).await?;
    info!(user_id = id, skill_level = metrics.skill_level, "Updated analyst metrics");

    Ok(Json(metrics))
}
