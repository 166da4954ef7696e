//! API routes.

pub mod analysts;
pub mod analytics;
pub mod health;
pub mod incidents;
pub mod preferences;
pub mod training;
pub mod users;

use crate::state::AppState;
use axum::Router;

/// Creates the main API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // Unversioned alias used by the dashboard frontend.
        .nest("/api", api_routes())
        .merge(health::routes())
        .with_state(state)
}

/// API routes under the /api prefixes.
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/analytics", analytics::routes())
        .nest("/preferences", preferences::routes())
        .nest("/users", users::routes())
        .nest("/incidents", incidents::routes())
        .nest("/analysts", analysts::routes())
        .nest("/training", training::routes())
        .merge(health::routes())
}
