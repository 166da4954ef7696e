//! Incident analytics endpoint.
//!
//! A single `GET /analytics?type=...` route answers all four dashboard
//! reports.

use axum::{extract::State, routing::get, Json, Router};
use soc_core::{AnalyticsError, Report, ReportRequest, ReportType};
use tracing::warn;

use crate::dto::{AnalyticsQuery, AnalyticsResponse};
use crate::error::ApiError;
use crate::extractors::ApiQuery;
use crate::state::AppState;

/// Creates analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_analytics))
}

/// Run one analytics report.
#[utoipa::path(
    get,
    path = "/api/analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Report data", body = AnalyticsResponse),
        (status = 400, description = "Unknown or missing type, or invalid parameters"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Analytics"
)]
async fn get_analytics(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let report_type = ReportType::parse(query.report_type.as_deref())?;
    let request = ReportRequest {
        report_type,
        user_id: query.user_id,
        limit: query.limit,
    };

    match state.analytics.run(&request).await {
        Ok(data) => Ok(Json(AnalyticsResponse {
            data,
            degraded: None,
        })),
        Err(AnalyticsError::Storage(err)) if state.degrade_on_storage_error => {
            warn!(
                report = %report_type,
                kind = err.kind(),
                error = %err,
                "Analytics store unavailable, serving empty report"
            );
            Ok(Json(AnalyticsResponse {
                data: Report::empty(report_type),
                degraded: Some(true),
            }))
        }
        Err(err) => Err(err.into()),
    }
}
