//! Analyst metrics snapshot repository.
//!
//! Snapshots are only ever written through [`AnalystMetricsRepository::upsert`];
//! nothing here derives them from incident rows.

use super::{format_timestamp, parse_timestamp, DbError, DbPool};
use crate::user::{AnalystMetrics, AnalystMetricsUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository trait for analyst metrics persistence.
#[async_trait]
pub trait AnalystMetricsRepository: Send + Sync {
    /// Inserts or replaces the snapshot for `user_id`.
    async fn upsert(
        &self,
        user_id: i64,
        update: &AnalystMetricsUpdate,
    ) -> Result<AnalystMetrics, DbError>;

    /// Gets the snapshot for a user, if one was ever written.
    async fn get(&self, user_id: i64) -> Result<Option<AnalystMetrics>, DbError>;
}

/// SQLite implementation of AnalystMetricsRepository.
pub struct SqliteAnalystMetricsRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteAnalystMetricsRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalystMetricsRepository for SqliteAnalystMetricsRepository {
    async fn upsert(
        &self,
        user_id: i64,
        update: &AnalystMetricsUpdate,
    ) -> Result<AnalystMetrics, DbError> {
        let row: SqliteMetricsRow = sqlx::query_as(
            r#"
            INSERT INTO analyst_metrics (user_id, incidents_handled, avg_response_time, success_rate, skill_level, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                incidents_handled = excluded.incidents_handled,
                avg_response_time = excluded.avg_response_time,
                success_rate = excluded.success_rate,
                skill_level = excluded.skill_level,
                updated_at = excluded.updated_at
            RETURNING user_id, incidents_handled, avg_response_time, success_rate, skill_level, updated_at
            "#,
        )
        .bind(user_id)
        .bind(update.incidents_handled)
        .bind(update.avg_response_time)
        .bind(update.success_rate)
        .bind(update.skill_level)
        .bind(format_timestamp(&Utc::now()))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, user_id: i64) -> Result<Option<AnalystMetrics>, DbError> {
        let row: Option<SqliteMetricsRow> = sqlx::query_as(
            r#"
            SELECT user_id, incidents_handled, avg_response_time, success_rate, skill_level, updated_at
            FROM analyst_metrics WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

/// PostgreSQL implementation of AnalystMetricsRepository.
pub struct PgAnalystMetricsRepository {
    pool: sqlx::PgPool,
}

impl PgAnalystMetricsRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalystMetricsRepository for PgAnalystMetricsRepository {
    async fn upsert(
        &self,
        user_id: i64,
        update: &AnalystMetricsUpdate,
    ) -> Result<AnalystMetrics, DbError> {
        let row: PgMetricsRow = sqlx::query_as(
            r#"
            INSERT INTO analyst_metrics (user_id, incidents_handled, avg_response_time, success_rate, skill_level, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(user_id) DO UPDATE SET
                incidents_handled = EXCLUDED.incidents_handled,
                avg_response_time = EXCLUDED.avg_response_time,
                success_rate = EXCLUDED.success_rate,
                skill_level = EXCLUDED.skill_level,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, incidents_handled, avg_response_time, success_rate, skill_level, updated_at
            "#,
        )
        .bind(user_id)
        .bind(update.incidents_handled)
        .bind(update.avg_response_time)
        .bind(update.success_rate)
        .bind(update.skill_level)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, user_id: i64) -> Result<Option<AnalystMetrics>, DbError> {
        let row: Option<PgMetricsRow> = sqlx::query_as(
            r#"
            SELECT user_id, incidents_handled, avg_response_time, success_rate, skill_level, updated_at
            FROM analyst_metrics WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

/// Creates an analyst metrics repository based on the pool type.
pub fn create_analyst_metrics_repository(pool: &DbPool) -> Box<dyn AnalystMetricsRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteAnalystMetricsRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgAnalystMetricsRepository::new(pool.clone())),
    }
}

#[derive(sqlx::FromRow)]
struct SqliteMetricsRow {
    user_id: i64,
    incidents_handled: i64,
    avg_response_time: f64,
    success_rate: f64,
    skill_level: i32,
    updated_at: String,
}

impl TryFrom<SqliteMetricsRow> for AnalystMetrics {
    type Error = DbError;

    fn try_from(row: SqliteMetricsRow) -> Result<Self, Self::Error> {
        Ok(AnalystMetrics {
            user_id: row.user_id,
            incidents_handled: row.incidents_handled,
            avg_response_time: row.avg_response_time,
            success_rate: row.success_rate,
            skill_level: row.skill_level,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgMetricsRow {
    user_id: i64,
    incidents_handled: i64,
    avg_response_time: f64,
    success_rate: f64,
    skill_level: i32,
    updated_at: DateTime<Utc>,
}

impl From<PgMetricsRow> for AnalystMetrics {
    fn from(row: PgMetricsRow) -> Self {
        AnalystMetrics {
            user_id: row.user_id,
            incidents_handled: row.incidents_handled,
            avg_response_time: row.avg_response_time,
            success_rate: row.success_rate,
            skill_level: row.skill_level,
            updated_at: row.updated_at,
        }
    }
}
