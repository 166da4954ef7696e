//! User administration endpoints.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use soc_core::db::create_user_repository;
use soc_core::{NewUser, User};
use tracing::info;
use validator::Validate;

use crate::dto::ListUsersQuery;
use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Creates user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_users).post(create_user))
}

/// List users.
#[utoipa::path(
    get,
    path = "/api/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users ordered by id", body = Vec<User>),
        (status = 400, description = "Unknown role"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Users"
)]
async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let repo = create_user_repository(&state.db);
    Ok(Json(repo.list(query.role).await?))
}

/// Create a user.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Users"
)]
async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    request.validate()?;

    let repo = create_user_repository(&state.db);
    if repo.get_by_email(&request.email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "User with email '{}' already exists",
            request.email
        )));
    }

    let user = repo.create(&request).await?;
    info!(user_id = user.id, role = %user.role, "Created user");

    Ok((StatusCode::CREATED, Json(user)))
}
