//! Read-only aggregation queries behind the analytics service.
//!
//! Each report is a single statement. Status buckets are bound from
//! [`OPEN_STATUSES`] and [`CLOSED_STATUSES`], so a row with a status outside
//! the enum is counted in the total but in neither bucket, and is left out
//! of the recent incidents feed.

use super::incident_repo::{PgIncidentRow, SqliteIncidentRow};
use super::training_repo::{PgTrainingRow, SqliteTrainingRow};
use super::{DbError, DbPool};
use crate::analytics::{AnalystPerformance, AnalyticsOverview, RecentIncident, TrainingRecordView};
use crate::incident::{Severity, CLOSED_STATUSES, OPEN_STATUSES};
use crate::user::Role;
use async_trait::async_trait;

/// Repository trait for analytics queries.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Counts and mean-time metrics over all incidents.
    async fn overview(&self) -> Result<AnalyticsOverview, DbError>;

    /// Performance rows for non-admin users ordered by id, optionally one user.
    async fn analyst_performance(
        &self,
        analyst_id: Option<i64>,
    ) -> Result<Vec<AnalystPerformance>, DbError>;

    /// Most recently created incidents with assignee names.
    async fn recent_incidents(&self, limit: u32) -> Result<Vec<RecentIncident>, DbError>;

    /// Training records with owner names in insertion order.
    async fn training_records(&self, user_id: Option<i64>)
        -> Result<Vec<TrainingRecordView>, DbError>;
}

const OVERVIEW_SQLITE: &str = r#"
    SELECT
        COUNT(*) AS total_incidents,
        COALESCE(SUM(CASE WHEN status IN (?, ?) THEN 1 ELSE 0 END), 0) AS open_incidents,
        COALESCE(SUM(CASE WHEN status IN (?, ?) THEN 1 ELSE 0 END), 0) AS closed_incidents,
        AVG(detection_time) AS average_mttd,
        AVG(response_time) AS average_mttr,
        COALESCE(SUM(CASE WHEN severity = ? THEN 1 ELSE 0 END), 0) AS critical_incidents
    FROM incidents
"#;

const OVERVIEW_PG: &str = r#"
    SELECT
        COUNT(*) AS total_incidents,
        COUNT(*) FILTER (WHERE status IN ($1, $2)) AS open_incidents,
        COUNT(*) FILTER (WHERE status IN ($3, $4)) AS closed_incidents,
        AVG(detection_time)::FLOAT8 AS average_mttd,
        AVG(response_time)::FLOAT8 AS average_mttr,
        COUNT(*) FILTER (WHERE severity = $5) AS critical_incidents
    FROM incidents
"#;

/// SQLite implementation of AnalyticsRepository.
pub struct SqliteAnalyticsRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteAnalyticsRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for SqliteAnalyticsRepository {
    async fn overview(&self) -> Result<AnalyticsOverview, DbError> {
        let row: OverviewRow = sqlx::query_as(OVERVIEW_SQLITE)
            .bind(OPEN_STATUSES[0].as_db_str())
            .bind(OPEN_STATUSES[1].as_db_str())
            .bind(CLOSED_STATUSES[0].as_db_str())
            .bind(CLOSED_STATUSES[1].as_db_str())
            .bind(Severity::Critical.as_db_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn analyst_performance(
        &self,
        analyst_id: Option<i64>,
    ) -> Result<Vec<AnalystPerformance>, DbError> {
        let rows: Vec<PerformanceRow> = sqlx::query_as(
            r#"
            SELECT
                u.id AS id,
                u.name AS analyst_name,
                COALESCE(am.incidents_handled, 0) AS total_incidents,
                COALESCE(am.avg_response_time, 0.0) AS avg_response_time,
                (SELECT COUNT(*) FROM incidents i
                  WHERE i.assigned_to = u.id AND i.status IN (?, ?)) AS incidents_closed,
                COALESCE(am.success_rate, 0.0) AS performance_score
            FROM users u
            LEFT JOIN analyst_metrics am ON am.user_id = u.id
            WHERE u.role <> ? AND (? IS NULL OR u.id = ?)
            ORDER BY u.id
            "#,
        )
        .bind(CLOSED_STATUSES[0].as_db_str())
        .bind(CLOSED_STATUSES[1].as_db_str())
        .bind(Role::Admin.as_str())
        .bind(analyst_id)
        .bind(analyst_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recent_incidents(&self, limit: u32) -> Result<Vec<RecentIncident>, DbError> {
        let rows: Vec<SqliteRecentIncidentRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.title, i.severity, i.status, i.assigned_to, i.detected_at, i.responded_at,
                   i.resolved_at, i.detection_time, i.response_time, i.resolution_time, i.created_at,
                   u.name AS assigned_to_name
            FROM incidents i
            LEFT JOIN users u ON u.id = i.assigned_to
            WHERE i.status IN (?, ?, ?, ?)
            ORDER BY i.created_at DESC, i.id DESC
            LIMIT ?
            "#,
        )
        .bind(OPEN_STATUSES[0].as_db_str())
        .bind(OPEN_STATUSES[1].as_db_str())
        .bind(CLOSED_STATUSES[0].as_db_str())
        .bind(CLOSED_STATUSES[1].as_db_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RecentIncident {
                    incident: row.incident.try_into()?,
                    assigned_to_name: row.assigned_to_name,
                })
            })
            .collect()
    }

    async fn training_records(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<TrainingRecordView>, DbError> {
        let rows: Vec<SqliteTrainingViewRow> = sqlx::query_as(
            r#"
            SELECT t.id, t.user_id, t.course_name, t.certification_name, t.status, t.score,
                   t.completed_at, t.expires_at, t.created_at, u.name AS user_name
            FROM training_records t
            JOIN users u ON u.id = t.user_id
            WHERE (? IS NULL OR t.user_id = ?)
            ORDER BY t.id
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TrainingRecordView {
                    record: row.record.try_into()?,
                    user_name: row.user_name,
                })
            })
            .collect()
    }
}

/// PostgreSQL implementation of AnalyticsRepository.
pub struct PgAnalyticsRepository {
    pool: sqlx::PgPool,
}

impl PgAnalyticsRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn overview(&self) -> Result<AnalyticsOverview, DbError> {
        let row: OverviewRow = sqlx::query_as(OVERVIEW_PG)
            .bind(OPEN_STATUSES[0].as_db_str())
            .bind(OPEN_STATUSES[1].as_db_str())
            .bind(CLOSED_STATUSES[0].as_db_str())
            .bind(CLOSED_STATUSES[1].as_db_str())
            .bind(Severity::Critical.as_db_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn analyst_performance(
        &self,
        analyst_id: Option<i64>,
    ) -> Result<Vec<AnalystPerformance>, DbError> {
        let rows: Vec<PerformanceRow> = sqlx::query_as(
            r#"
            SELECT
                u.id AS id,
                u.name AS analyst_name,
                COALESCE(am.incidents_handled, 0) AS total_incidents,
                COALESCE(am.avg_response_time, 0)::FLOAT8 AS avg_response_time,
                (SELECT COUNT(*) FROM incidents i
                  WHERE i.assigned_to = u.id AND i.status IN ($1, $2)) AS incidents_closed,
                COALESCE(am.success_rate, 0)::FLOAT8 AS performance_score
            FROM users u
            LEFT JOIN analyst_metrics am ON am.user_id = u.id
            WHERE u.role <> $3 AND ($4::BIGINT IS NULL OR u.id = $4)
            ORDER BY u.id
            "#,
        )
        .bind(CLOSED_STATUSES[0].as_db_str())
        .bind(CLOSED_STATUSES[1].as_db_str())
        .bind(Role::Admin.as_str())
        .bind(analyst_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recent_incidents(&self, limit: u32) -> Result<Vec<RecentIncident>, DbError> {
        let rows: Vec<PgRecentIncidentRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.title, i.severity, i.status, i.assigned_to, i.detected_at, i.responded_at,
                   i.resolved_at, i.detection_time, i.response_time, i.resolution_time, i.created_at,
                   u.name AS assigned_to_name
            FROM incidents i
            LEFT JOIN users u ON u.id = i.assigned_to
            WHERE i.status IN ($1, $2, $3, $4)
            ORDER BY i.created_at DESC, i.id DESC
            LIMIT $5
            "#,
        )
        .bind(OPEN_STATUSES[0].as_db_str())
        .bind(OPEN_STATUSES[1].as_db_str())
        .bind(CLOSED_STATUSES[0].as_db_str())
        .bind(CLOSED_STATUSES[1].as_db_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RecentIncident {
                    incident: row.incident.try_into()?,
                    assigned_to_name: row.assigned_to_name,
                })
            })
            .collect()
    }

    async fn training_records(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<TrainingRecordView>, DbError> {
        let rows: Vec<PgTrainingViewRow> = sqlx::query_as(
            r#"
            SELECT t.id, t.user_id, t.course_name, t.certification_name, t.status, t.score,
                   t.completed_at, t.expires_at, t.created_at, u.name AS user_name
            FROM training_records t
            JOIN users u ON u.id = t.user_id
            WHERE ($1::BIGINT IS NULL OR t.user_id = $1)
            ORDER BY t.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TrainingRecordView {
                    record: row.record.try_into()?,
                    user_name: row.user_name,
                })
            })
            .collect()
    }
}

/// Creates an analytics repository based on the pool type.
pub fn create_analytics_repository(pool: &DbPool) -> Box<dyn AnalyticsRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteAnalyticsRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgAnalyticsRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct OverviewRow {
    total_incidents: i64,
    open_incidents: i64,
    closed_incidents: i64,
    average_mttd: Option<f64>,
    average_mttr: Option<f64>,
    critical_incidents: i64,
}

impl From<OverviewRow> for AnalyticsOverview {
    fn from(row: OverviewRow) -> Self {
        AnalyticsOverview {
            total_incidents: row.total_incidents,
            open_incidents: row.open_incidents,
            closed_incidents: row.closed_incidents,
            average_mttd: row.average_mttd.unwrap_or(0.0),
            average_mttr: row.average_mttr.unwrap_or(0.0),
            critical_incidents: row.critical_incidents,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PerformanceRow {
    id: i64,
    analyst_name: String,
    total_incidents: i64,
    avg_response_time: f64,
    incidents_closed: i64,
    performance_score: f64,
}

impl From<PerformanceRow> for AnalystPerformance {
    fn from(row: PerformanceRow) -> Self {
        AnalystPerformance {
            id: row.id,
            analyst_name: row.analyst_name,
            total_incidents: row.total_incidents,
            avg_response_time: row.avg_response_time,
            incidents_closed: row.incidents_closed,
            performance_score: row.performance_score,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SqliteRecentIncidentRow {
    #[sqlx(flatten)]
    incident: SqliteIncidentRow,
    assigned_to_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PgRecentIncidentRow {
    #[sqlx(flatten)]
    incident: PgIncidentRow,
    assigned_to_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct SqliteTrainingViewRow {
    #[sqlx(flatten)]
    record: SqliteTrainingRow,
    user_name: String,
}

#[derive(sqlx::FromRow)]
struct PgTrainingViewRow {
    #[sqlx(flatten)]
    record: PgTrainingRow,
    user_name: String,
}
