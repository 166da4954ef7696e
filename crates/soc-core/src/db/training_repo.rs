//! Training record repository.

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp, DbError, DbPool};
use crate::training::{NewTrainingRecord, TrainingRecord, TrainingStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository trait for training record persistence.
#[async_trait]
pub trait TrainingRepository: Send + Sync {
    /// Creates a training record.
    async fn create(&self, record: &NewTrainingRecord) -> Result<TrainingRecord, DbError>;
}

/// SQLite implementation of TrainingRepository.
pub struct SqliteTrainingRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteTrainingRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrainingRepository for SqliteTrainingRepository {
    async fn create(&self, record: &NewTrainingRecord) -> Result<TrainingRecord, DbError> {
        let row: SqliteTrainingRow = sqlx::query_as(
            r#"
            INSERT INTO training_records (user_id, course_name, certification_name, status, score, completed_at, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, course_name, certification_name, status, score, completed_at, expires_at, created_at
            "#,
        )
        .bind(record.user_id)
        .bind(&record.course_name)
        .bind(&record.certification_name)
        .bind(record.status.as_db_str())
        .bind(record.score)
        .bind(record.completed_at.as_ref().map(format_timestamp))
        .bind(record.expires_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&Utc::now()))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}

/// PostgreSQL implementation of TrainingRepository.
pub struct PgTrainingRepository {
    pool: sqlx::PgPool,
}

impl PgTrainingRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrainingRepository for PgTrainingRepository {
    async fn create(&self, record: &NewTrainingRecord) -> Result<TrainingRecord, DbError> {
        let row: PgTrainingRow = sqlx::query_as(
            r#"
            INSERT INTO training_records (user_id, course_name, certification_name, status, score, completed_at, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, course_name, certification_name, status, score, completed_at, expires_at, created_at
            "#,
        )
        .bind(record.user_id)
        .bind(&record.course_name)
        .bind(&record.certification_name)
        .bind(record.status.as_db_str())
        .bind(record.score)
        .bind(record.completed_at)
        .bind(record.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}

/// Creates a training repository based on the pool type.
pub fn create_training_repository(pool: &DbPool) -> Box<dyn TrainingRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteTrainingRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgTrainingRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping. The analytics queries reuse them.

#[derive(sqlx::FromRow)]
pub(crate) struct SqliteTrainingRow {
    id: i64,
    user_id: i64,
    course_name: String,
    certification_name: Option<String>,
    status: String,
    score: Option<i32>,
    completed_at: Option<String>,
    expires_at: Option<String>,
    created_at: String,
}

impl TryFrom<SqliteTrainingRow> for TrainingRecord {
    type Error = DbError;

    fn try_from(row: SqliteTrainingRow) -> Result<Self, Self::Error> {
        Ok(TrainingRecord {
            id: row.id,
            user_id: row.user_id,
            course_name: row.course_name,
            certification_name: row.certification_name,
            status: parse_status(&row.status)?,
            score: row.score,
            completed_at: parse_optional_timestamp(row.completed_at)?,
            expires_at: parse_optional_timestamp(row.expires_at)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PgTrainingRow {
    id: i64,
    user_id: i64,
    course_name: String,
    certification_name: Option<String>,
    status: String,
    score: Option<i32>,
    completed_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgTrainingRow> for TrainingRecord {
    type Error = DbError;

    fn try_from(row: PgTrainingRow) -> Result<Self, Self::Error> {
        Ok(TrainingRecord {
            id: row.id,
            user_id: row.user_id,
            course_name: row.course_name,
            certification_name: row.certification_name,
            status: parse_status(&row.status)?,
            score: row.score,
            completed_at: row.completed_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

fn parse_status(s: &str) -> Result<TrainingStatus, DbError> {
    s.parse::<TrainingStatus>().map_err(DbError::Serialization)
}
