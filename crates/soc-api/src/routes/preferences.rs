//! Dashboard preference endpoints.

use axum::{extract::State, routing::get, Json, Router};
use soc_core::db::{create_preferences_repository, create_user_repository};
use tracing::info;
use validator::Validate;

use crate::dto::{
    PreferencesQuery, PreferencesResponse, SavePreferencesRequest, SavePreferencesResponse,
};
use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiQuery};
use crate::state::AppState;

const USER_ID_REQUIRED: &str = "User ID is required";

/// Creates preference routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_preferences).post(save_preferences))
}

/// Get a user's preferences.
///
/// Users that never saved get the defaults, which are not written back.
#[utoipa::path(
    get,
    path = "/api/preferences",
    params(PreferencesQuery),
    responses(
        (status = 200, description = "Stored or default preferences", body = PreferencesResponse),
        (status = 400, description = "Missing userId"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Preferences"
)]
async fn get_preferences(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PreferencesQuery>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::BadRequest(USER_ID_REQUIRED.to_string()))?;
    ensure_user_exists(&state, user_id).await?;

    let repo = create_preferences_repository(&state.db);
    let preferences = repo.get_or_default(user_id).await?;

    Ok(Json(PreferencesResponse { preferences }))
}

/// Save a user's preferences.
///
/// Fields omitted from `preferences` keep their stored (or default) value.
#[utoipa::path(
    post,
    path = "/api/preferences",
    request_body = SavePreferencesRequest,
    responses(
        (status = 200, description = "Preferences saved", body = SavePreferencesResponse),
        (status = 400, description = "Missing userId or malformed body"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Preferences"
)]
async fn save_preferences(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SavePreferencesRequest>,
) -> Result<Json<SavePreferencesResponse>, ApiError> {
    let user_id = request
        .user_id
        .ok_or_else(|| ApiError::BadRequest(USER_ID_REQUIRED.to_string()))?;

    let update = request.preferences;
    update.validate()?;
    update.check_layout().map_err(ApiError::UnprocessableEntity)?;

    ensure_user_exists(&state, user_id).await?;

    let repo = create_preferences_repository(&state.db);
    let current = repo.get_or_default(user_id).await?;
    let preferences = repo.save(&update.apply_to(current)).await?;

    info!(user_id, "Saved dashboard preferences");

    Ok(Json(SavePreferencesResponse {
        success: true,
        message: "Preferences saved successfully".to_string(),
        preferences,
    }))
}

async fn ensure_user_exists(state: &AppState, user_id: i64) -> Result<(), ApiError> {
    let users = create_user_repository(&state.db);
    match users.get(user_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("User {} not found", user_id))),
    }
}
