//! Data Transfer Objects for API requests and responses.

use serde::{Deserialize, Serialize};
use soc_core::{PreferencesUpdate, Report, Role, UserPreferences};
use utoipa::{IntoParams, ToSchema};

// ============================================================================
// Health DTOs
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub uptime_seconds: u64,
}

/// Database health status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub db_type: String,
    pub pool_size: u32,
    pub idle_connections: usize,
}

// ============================================================================
// Analytics DTOs
// ============================================================================

/// Query parameters for the analytics endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Report type: overview, analyst-performance, recent-incidents or training.
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    /// Analyst (or training owner) filter.
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
    /// Row limit for recent incidents (default 10, max 100).
    pub limit: Option<u32>,
}

/// Analytics response envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub data: Report,
    /// Present and true when the store failed and `data` is a placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
}

// ============================================================================
// Preferences DTOs
// ============================================================================

/// Query parameters for reading preferences.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreferencesQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

/// Preferences read response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PreferencesResponse {
    pub preferences: UserPreferences,
}

/// Request body for saving preferences.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SavePreferencesRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub preferences: PreferencesUpdate,
}

/// Preferences save response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SavePreferencesResponse {
    pub success: bool,
    pub message: String,
    /// The stored preferences after the merge.
    pub preferences: UserPreferences,
}

// ============================================================================
// Admin DTOs
// ============================================================================

/// Request to move an incident to a new status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusTransitionRequest {
    /// Target status name. Unknown names are rejected.
    pub status: String,
}

/// Query parameters for listing users.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Restrict the list to one role.
    pub role: Option<Role>,
}
