//! User repository for database operations.

use super::{format_timestamp, parse_timestamp, DbError, DbPool};
use crate::user::{NewUser, Role, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository trait for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a new user and returns it with its assigned id.
    async fn create(&self, user: &NewUser) -> Result<User, DbError>;

    /// Gets a user by ID.
    async fn get(&self, id: i64) -> Result<Option<User>, DbError>;

    /// Gets a user by email.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Lists users, optionally restricted to one role, ordered by id.
    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, DbError>;

    /// Checks if any users exist (for initial setup).
    async fn any_exist(&self) -> Result<bool, DbError>;
}

/// SQLite implementation of UserRepository.
pub struct SqliteUserRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, DbError> {
        let created_at = Utc::now();

        let row: SqliteUserRow = sqlx::query_as(
            r#"
            INSERT INTO users (email, name, role, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, email, name, role, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(format_timestamp(&created_at))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: i64) -> Result<Option<User>, DbError> {
        let row: Option<SqliteUserRow> =
            sqlx::query_as("SELECT id, email, name, role, created_at FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let row: Option<SqliteUserRow> =
            sqlx::query_as("SELECT id, email, name, role, created_at FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, DbError> {
        let rows: Vec<SqliteUserRow> = match role {
            Some(role) => {
                sqlx::query_as(
                    "SELECT id, email, name, role, created_at FROM users WHERE role = ? ORDER BY id",
                )
                .bind(role.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT id, email, name, role, created_at FROM users ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn any_exist(&self) -> Result<bool, DbError> {
        let (exists,): (i64,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists != 0)
    }
}

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: sqlx::PgPool,
}

impl PgUserRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, DbError> {
        let row: PgUserRow = sqlx::query_as(
            r#"
            INSERT INTO users (email, name, role, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, role, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: i64) -> Result<Option<User>, DbError> {
        let row: Option<PgUserRow> =
            sqlx::query_as("SELECT id, email, name, role, created_at FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let row: Option<PgUserRow> =
            sqlx::query_as("SELECT id, email, name, role, created_at FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, DbError> {
        let rows: Vec<PgUserRow> = sqlx::query_as(
            r#"
            SELECT id, email, name, role, created_at FROM users
            WHERE ($1::TEXT IS NULL OR role = $1)
            ORDER BY id
            "#,
        )
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn any_exist(&self) -> Result<bool, DbError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

/// Creates a user repository based on the pool type.
pub fn create_user_repository(pool: &DbPool) -> Box<dyn UserRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteUserRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgUserRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteUserRow {
    id: i64,
    email: String,
    name: String,
    role: String,
    created_at: String,
}

impl TryFrom<SqliteUserRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteUserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: parse_role(&row.role)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgUserRow {
    id: i64,
    email: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgUserRow> for User {
    type Error = DbError;

    fn try_from(row: PgUserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: parse_role(&row.role)?,
            created_at: row.created_at,
        })
    }
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    s.parse::<Role>()
        .map_err(|_| DbError::Serialization(format!("Invalid role: {}", s)))
}
