//! Incident repository for database operations.

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp, DbError, DbPool};
use crate::incident::{Incident, IncidentStatus, NewIncident, Severity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Lifecycle columns written by a status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleUpdate {
    pub status: IncidentStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub response_time: Option<i64>,
    pub resolution_time: Option<i64>,
}

impl From<&Incident> for LifecycleUpdate {
    fn from(incident: &Incident) -> Self {
        Self {
            status: incident.status,
            responded_at: incident.responded_at,
            resolved_at: incident.resolved_at,
            response_time: incident.response_time,
            resolution_time: incident.resolution_time,
        }
    }
}

/// Repository trait for incident persistence.
#[async_trait]
pub trait IncidentRepository: Send + Sync {
    /// Inserts an incident with an explicit creation time.
    async fn insert(
        &self,
        incident: &NewIncident,
        created_at: DateTime<Utc>,
    ) -> Result<Incident, DbError>;

    /// Creates an incident created now.
    async fn create(&self, incident: &NewIncident) -> Result<Incident, DbError> {
        self.insert(incident, Utc::now()).await
    }

    /// Gets an incident by ID.
    async fn get(&self, id: i64) -> Result<Option<Incident>, DbError>;

    /// Writes the status and lifecycle timestamps of an incident whose stored
    /// status is still `expected`.
    ///
    /// Returns `Ok(false)` when the incident exists but its status has moved on
    /// since it was read, and `DbError::NotFound` when it does not exist.
    async fn update_lifecycle(
        &self,
        id: i64,
        expected: IncidentStatus,
        update: &LifecycleUpdate,
    ) -> Result<bool, DbError>;
}

/// SQLite implementation of IncidentRepository.
pub struct SqliteIncidentRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteIncidentRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidentRepository for SqliteIncidentRepository {
    async fn insert(
        &self,
        incident: &NewIncident,
        created_at: DateTime<Utc>,
    ) -> Result<Incident, DbError> {
        let detected_at = incident.detected_at.unwrap_or(created_at);

        let row: SqliteIncidentRow = sqlx::query_as(
            r#"
            INSERT INTO incidents (title, severity, status, assigned_to, detected_at, responded_at, resolved_at,
                                   detection_time, response_time, resolution_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, title, severity, status, assigned_to, detected_at, responded_at, resolved_at,
                      detection_time, response_time, resolution_time, created_at
            "#,
        )
        .bind(&incident.title)
        .bind(incident.severity.as_db_str())
        .bind(incident.status.as_db_str())
        .bind(incident.assigned_to)
        .bind(format_timestamp(&detected_at))
        .bind(incident.responded_at.as_ref().map(format_timestamp))
        .bind(incident.resolved_at.as_ref().map(format_timestamp))
        .bind(incident.detection_time)
        .bind(incident.response_time)
        .bind(incident.resolution_time)
        .bind(format_timestamp(&created_at))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: i64) -> Result<Option<Incident>, DbError> {
        let row: Option<SqliteIncidentRow> = sqlx::query_as(
            r#"
            SELECT id, title, severity, status, assigned_to, detected_at, responded_at, resolved_at,
                   detection_time, response_time, resolution_time, created_at
            FROM incidents WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_lifecycle(
        &self,
        id: i64,
        expected: IncidentStatus,
        update: &LifecycleUpdate,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE incidents
            SET status = ?, responded_at = ?, resolved_at = ?, response_time = ?, resolution_time = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(update.status.as_db_str())
        .bind(update.responded_at.as_ref().map(format_timestamp))
        .bind(update.resolved_at.as_ref().map(format_timestamp))
        .bind(update.response_time)
        .bind(update.resolution_time)
        .bind(id)
        .bind(expected.as_db_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM incidents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Ok(false),
            None => Err(DbError::not_found("Incident", id)),
        }
    }
}

/// PostgreSQL implementation of IncidentRepository.
pub struct PgIncidentRepository {
    pool: sqlx::PgPool,
}

impl PgIncidentRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidentRepository for PgIncidentRepository {
    async fn insert(
        &self,
        incident: &NewIncident,
        created_at: DateTime<Utc>,
    ) -> Result<Incident, DbError> {
        let row: PgIncidentRow = sqlx::query_as(
            r#"
            INSERT INTO incidents (title, severity, status, assigned_to, detected_at, responded_at, resolved_at,
                                   detection_time, response_time, resolution_time, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, title, severity, status, assigned_to, detected_at, responded_at, resolved_at,
                      detection_time, response_time, resolution_time, created_at
            "#,
        )
        .bind(&incident.title)
        .bind(incident.severity.as_db_str())
        .bind(incident.status.as_db_str())
        .bind(incident.assigned_to)
        .bind(incident.detected_at.unwrap_or(created_at))
        .bind(incident.responded_at)
        .bind(incident.resolved_at)
        .bind(incident.detection_time)
        .bind(incident.response_time)
        .bind(incident.resolution_time)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: i64) -> Result<Option<Incident>, DbError> {
        let row: Option<PgIncidentRow> = sqlx::query_as(
            r#"
            SELECT id, title, severity, status, assigned_to, detected_at, responded_at, resolved_at,
                   detection_time, response_time, resolution_time, created_at
            FROM incidents WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_lifecycle(
        &self,
        id: i64,
        expected: IncidentStatus,
        update: &LifecycleUpdate,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE incidents
            SET status = $1, responded_at = $2, resolved_at = $3, response_time = $4, resolution_time = $5
            WHERE id = $6 AND status = $7
            "#,
        )
        .bind(update.status.as_db_str())
        .bind(update.responded_at)
        .bind(update.resolved_at)
        .bind(update.response_time)
        .bind(update.resolution_time)
        .bind(id)
        .bind(expected.as_db_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM incidents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Ok(false),
            None => Err(DbError::not_found("Incident", id)),
        }
    }
}

/// Creates an incident repository based on the pool type.
pub fn create_incident_repository(pool: &DbPool) -> Box<dyn IncidentRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteIncidentRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgIncidentRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping. The analytics queries reuse them.

#[derive(sqlx::FromRow)]
pub(crate) struct SqliteIncidentRow {
    id: i64,
    title: String,
    severity: String,
    status: String,
    assigned_to: Option<i64>,
    detected_at: String,
    responded_at: Option<String>,
    resolved_at: Option<String>,
    detection_time: Option<i64>,
    response_time: Option<i64>,
    resolution_time: Option<i64>,
    created_at: String,
}

impl TryFrom<SqliteIncidentRow> for Incident {
    type Error = DbError;

    fn try_from(row: SqliteIncidentRow) -> Result<Self, Self::Error> {
        Ok(Incident {
            id: row.id,
            title: row.title,
            severity: parse_severity(&row.severity)?,
            status: parse_status(&row.status)?,
            assigned_to: row.assigned_to,
            detected_at: parse_timestamp(&row.detected_at)?,
            responded_at: parse_optional_timestamp(row.responded_at)?,
            resolved_at: parse_optional_timestamp(row.resolved_at)?,
            detection_time: row.detection_time,
            response_time: row.response_time,
            resolution_time: row.resolution_time,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PgIncidentRow {
    id: i64,
    title: String,
    severity: String,
    status: String,
    assigned_to: Option<i64>,
    detected_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
    detection_time: Option<i64>,
    response_time: Option<i64>,
    resolution_time: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgIncidentRow> for Incident {
    type Error = DbError;

    fn try_from(row: PgIncidentRow) -> Result<Self, Self::Error> {
        Ok(Incident {
            id: row.id,
            title: row.title,
            severity: parse_severity(&row.severity)?,
            status: parse_status(&row.status)?,
            assigned_to: row.assigned_to,
            detected_at: row.detected_at,
            responded_at: row.responded_at,
            resolved_at: row.resolved_at,
            detection_time: row.detection_time,
            response_time: row.response_time,
            resolution_time: row.resolution_time,
            created_at: row.created_at,
        })
    }
}

fn parse_severity(s: &str) -> Result<Severity, DbError> {
    s.parse::<Severity>()
        .map_err(|e| DbError::Serialization(e.to_string()))
}

fn parse_status(s: &str) -> Result<IncidentStatus, DbError> {
    s.parse::<IncidentStatus>()
        .map_err(|e| DbError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_get_incident() {
        let pool = memory_pool().await;
        let repo = create_incident_repository(&pool);

        let mut new = NewIncident::new("Malware detected on endpoint", Severity::Critical);
        new.detection_time = Some(42);

        let created = repo.create(&new).await.unwrap();
        assert_eq!(created.status, IncidentStatus::Open);
        assert_eq!(created.detected_at, created.created_at);

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.detection_time, Some(42));
    }

    #[tokio::test]
    async fn test_update_lifecycle_persists_transition() {
        let pool = memory_pool().await;
        let repo = create_incident_repository(&pool);

        let mut new = NewIncident::new("Unusual network traffic", Severity::Medium);
        let detected = Utc::now() - Duration::hours(2);
        new.detected_at = Some(detected);
        let mut incident = repo.create(&new).await.unwrap();

        incident
            .transition(IncidentStatus::Closed, detected + Duration::minutes(90))
            .unwrap();
        let applied = repo
            .update_lifecycle(incident.id, IncidentStatus::Open, &LifecycleUpdate::from(&incident))
            .await
            .unwrap();
        assert!(applied);

        let stored = repo.get(incident.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IncidentStatus::Closed);
        assert_eq!(stored.response_time, Some(90));
        assert_eq!(stored.resolution_time, Some(0));
        assert!(stored.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_update_lifecycle_missing_incident() {
        let pool = memory_pool().await;
        let repo = create_incident_repository(&pool);
        let update = LifecycleUpdate {
            status: IncidentStatus::Investigating,
            responded_at: None,
            resolved_at: None,
            response_time: None,
            resolution_time: None,
        };

        let err = repo
            .update_lifecycle(999, IncidentStatus::Open, &update)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_lifecycle_rejects_stale_status() {
        let pool = memory_pool().await;
        let repo = create_incident_repository(&pool);
        let created = repo
            .create(&NewIncident::new("Credential stuffing burst", Severity::High))
            .await
            .unwrap();

        let mut first = repo.get(created.id).await.unwrap().unwrap();
        let mut second = repo.get(created.id).await.unwrap().unwrap();
        let now = Utc::now();

        second.transition(IncidentStatus::Closed, now).unwrap();
        let closed = repo
            .update_lifecycle(created.id, IncidentStatus::Open, &LifecycleUpdate::from(&second))
            .await
            .unwrap();
        assert!(closed);

        first.transition(IncidentStatus::Investigating, now).unwrap();
        let reopened = repo
            .update_lifecycle(created.id, IncidentStatus::Open, &LifecycleUpdate::from(&first))
            .await
            .unwrap();
        assert!(!reopened);

        let stored = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IncidentStatus::Closed);
        assert!(stored.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_stored_status_is_serialization_error() {
        let pool = memory_pool().await;
        let DbPool::Sqlite(sqlite) = &pool else {
            unreachable!()
        };
        sqlx::query(
            "INSERT INTO incidents (title, severity, status, detected_at, created_at) VALUES ('Legacy', 'low', 'triaged', ?, ?)",
        )
        .bind(format_timestamp(&Utc::now()))
        .bind(format_timestamp(&Utc::now()))
        .execute(sqlite)
        .await
        .unwrap();

        let repo = create_incident_repository(&pool);
        let err = repo.get(1).await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }
}
