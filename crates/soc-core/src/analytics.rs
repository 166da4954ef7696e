//! Incident analytics aggregation.
//!
//! [`AnalyticsService`] answers the four dashboard report types on top of an
//! injected [`AnalyticsRepository`]. Storage failures surface as
//! [`AnalyticsError::Storage`]; callers decide whether to degrade.

use crate::db::{AnalyticsRepository, DbError};
use crate::incident::Incident;
use crate::training::TrainingRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use utoipa::ToSchema;

/// Default number of rows returned by the recent incidents report.
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// Largest accepted recent incidents limit.
pub const MAX_RECENT_LIMIT: u32 = 100;

/// Errors returned by the analytics service.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid type parameter: {0}")]
    UnknownReportType(String),

    #[error("Missing type parameter")]
    MissingReportType,

    #[error("Limit must be between 0 and {max}, got {requested}")]
    InvalidLimit { requested: u32, max: u32 },

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl AnalyticsError {
    /// Returns true for failures of the underlying store.
    pub fn is_storage(&self) -> bool {
        matches!(self, AnalyticsError::Storage(_))
    }
}

/// Headline incident counts and mean-time metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AnalyticsOverview {
    #[serde(rename = "totalIncidents")]
    pub total_incidents: i64,
    /// Incidents that are open or investigating.
    #[serde(rename = "openIncidents")]
    pub open_incidents: i64,
    /// Incidents that are resolved or closed.
    #[serde(rename = "closedIncidents")]
    pub closed_incidents: i64,
    /// Mean time to detect in minutes, 0 when no incident has a value.
    #[serde(rename = "averageMTTD")]
    pub average_mttd: f64,
    /// Mean time to respond in minutes, 0 when no incident has a value.
    #[serde(rename = "averageMTTR")]
    pub average_mttr: f64,
    #[serde(rename = "criticalIncidents")]
    pub critical_incidents: i64,
}

/// One analyst row of the team performance report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AnalystPerformance {
    /// User id of the analyst.
    pub id: i64,
    pub analyst_name: String,
    /// Stored `incidents_handled` snapshot, 0 without a snapshot.
    pub total_incidents: i64,
    pub avg_response_time: f64,
    /// Live count of assigned incidents that are resolved or closed.
    pub incidents_closed: i64,
    /// Stored `success_rate` snapshot, 0 without a snapshot.
    pub performance_score: f64,
}

/// An incident with the name of its assignee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct RecentIncident {
    #[serde(flatten)]
    pub incident: Incident,
    pub assigned_to_name: Option<String>,
}

/// A training record with the name of its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TrainingRecordView {
    #[serde(flatten)]
    pub record: TrainingRecord,
    pub user_name: String,
}

/// Report selected by the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Overview,
    AnalystPerformance,
    RecentIncidents,
    Training,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Overview => "overview",
            ReportType::AnalystPerformance => "analyst-performance",
            ReportType::RecentIncidents => "recent-incidents",
            ReportType::Training => "training",
        }
    }

    /// Parses an optional `type` parameter.
    pub fn parse(value: Option<&str>) -> Result<Self, AnalyticsError> {
        value
            .ok_or(AnalyticsError::MissingReportType)?
            .parse()
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overview" => Ok(ReportType::Overview),
            "analyst-performance" => Ok(ReportType::AnalystPerformance),
            "recent-incidents" => Ok(ReportType::RecentIncidents),
            "training" => Ok(ReportType::Training),
            other => Err(AnalyticsError::UnknownReportType(other.to_string())),
        }
    }
}

/// A parsed analytics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub report_type: ReportType,
    /// Analyst or owner filter. Ignored by overview and recent incidents.
    pub user_id: Option<i64>,
    /// Row limit for recent incidents.
    pub limit: Option<u32>,
}

impl ReportRequest {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            user_id: None,
            limit: None,
        }
    }
}

/// Result of one analytics query.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(untagged)]
pub enum Report {
    Overview(AnalyticsOverview),
    AnalystPerformance(Vec<AnalystPerformance>),
    RecentIncidents(Vec<RecentIncident>),
    Training(Vec<TrainingRecordView>),
}

impl Report {
    /// The zeroed or empty payload for a report type.
    pub fn empty(report_type: ReportType) -> Self {
        match report_type {
            ReportType::Overview => Report::Overview(AnalyticsOverview::default()),
            ReportType::AnalystPerformance => Report::AnalystPerformance(Vec::new()),
            ReportType::RecentIncidents => Report::RecentIncidents(Vec::new()),
            ReportType::Training => Report::Training(Vec::new()),
        }
    }
}

/// Aggregates incident, analyst and training data for the dashboard.
#[derive(Clone)]
pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepository>) -> Self {
        Self { repo }
    }

    /// Runs the report named by `request`.
    #[instrument(skip(self), fields(report = %request.report_type))]
    pub async fn run(&self, request: &ReportRequest) -> Result<Report, AnalyticsError> {
        let report = match request.report_type {
            ReportType::Overview => Report::Overview(self.overview().await?),
            ReportType::AnalystPerformance => {
                Report::AnalystPerformance(self.analyst_performance(request.user_id).await?)
            }
            ReportType::RecentIncidents => {
                let limit = request.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
                Report::RecentIncidents(self.recent_incidents(limit).await?)
            }
            ReportType::Training => Report::Training(self.training_records(request.user_id).await?),
        };
        Ok(report)
    }

    /// Counts and mean-time metrics over all incidents.
    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<AnalyticsOverview, AnalyticsError> {
        let overview = self.repo.overview().await?;
        debug!(total = overview.total_incidents, "Computed incident overview");
        Ok(overview)
    }

    /// Performance rows for every non-admin user, or only `analyst_id`.
    #[instrument(skip(self))]
    pub async fn analyst_performance(
        &self,
        analyst_id: Option<i64>,
    ) -> Result<Vec<AnalystPerformance>, AnalyticsError> {
        Ok(self.repo.analyst_performance(analyst_id).await?)
    }

    /// The `limit` most recently created incidents.
    #[instrument(skip(self))]
    pub async fn recent_incidents(&self, limit: u32) -> Result<Vec<RecentIncident>, AnalyticsError> {
        if limit > MAX_RECENT_LIMIT {
            return Err(AnalyticsError::InvalidLimit {
                requested: limit,
                max: MAX_RECENT_LIMIT,
            });
        }
        if limit == 0 {
            return Ok(Vec::new());
        }
        Ok(self.repo.recent_incidents(limit).await?)
    }

    /// Training records, optionally for one user.
    #[instrument(skip(self))]
    pub async fn training_records(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<TrainingRecordView>, AnalyticsError> {
        Ok(self.repo.training_records(user_id).await?)
    }
}
