//! Training record endpoints.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use soc_core::db::{create_training_repository, create_user_repository};
use soc_core::{NewTrainingRecord, TrainingRecord};
use tracing::info;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::state::AppState;

/// Creates training routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(create_training_record))
}

/// Record a training course for a user.
#[utoipa::path(
    post,
    path = "/api/training",
    request_body = NewTrainingRecord,
    responses(
        (status = 201, description = "Training record created", body = TrainingRecord),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Training"
)]
async fn create_training_record(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewTrainingRecord>,
) -> Result<(StatusCode, Json<TrainingRecord>), ApiError> {
    request.validate()?;

    let users = create_user_repository(&state.db);
    if users.get(request.user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {} not found", request.user_id)));
    }

    let repo = create_training_repository(&state.db);
    let record = repo.create(&request).await?;
    info!(record_id = record.id, user_id = record.user_id, status = %record.status, "Created training record");

    Ok((StatusCode::CREATED, Json(record)))
}
