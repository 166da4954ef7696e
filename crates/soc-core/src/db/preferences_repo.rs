//! Dashboard preferences repository.
//!
//! Widgets and layout live in JSON text columns. Saving is an upsert keyed on
//! the user id, so the last write wins.

use super::{format_timestamp, parse_timestamp, DbError, DbPool};
use crate::preferences::{LayoutItem, Theme, UserPreferences, Widget};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository trait for preference persistence.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Gets the stored preferences for a user.
    async fn get(&self, user_id: i64) -> Result<Option<UserPreferences>, DbError>;

    /// Inserts or replaces the preferences of `prefs.user_id`.
    async fn save(&self, prefs: &UserPreferences) -> Result<UserPreferences, DbError>;

    /// Gets the stored preferences, or unsaved defaults if there are none.
    async fn get_or_default(&self, user_id: i64) -> Result<UserPreferences, DbError> {
        Ok(self
            .get(user_id)
            .await?
            .unwrap_or_else(|| UserPreferences::default_for(user_id)))
    }
}

/// SQLite implementation of PreferencesRepository.
pub struct SqlitePreferencesRepository {
    pool: sqlx::SqlitePool,
}

impl SqlitePreferencesRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferencesRepository for SqlitePreferencesRepository {
    async fn get(&self, user_id: i64) -> Result<Option<UserPreferences>, DbError> {
        let row: Option<SqlitePreferencesRow> = sqlx::query_as(
            r#"
            SELECT user_id, visible_widgets, dashboard_layout, theme, refresh_interval, updated_at
            FROM user_preferences WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn save(&self, prefs: &UserPreferences) -> Result<UserPreferences, DbError> {
        let row: SqlitePreferencesRow = sqlx::query_as(
            r#"
            INSERT INTO user_preferences (user_id, visible_widgets, dashboard_layout, theme, refresh_interval, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                visible_widgets = excluded.visible_widgets,
                dashboard_layout = excluded.dashboard_layout,
                theme = excluded.theme,
                refresh_interval = excluded.refresh_interval,
                updated_at = excluded.updated_at
            RETURNING user_id, visible_widgets, dashboard_layout, theme, refresh_interval, updated_at
            "#,
        )
        .bind(prefs.user_id)
        .bind(serde_json::to_string(&prefs.visible_widgets)?)
        .bind(serde_json::to_string(&prefs.dashboard_layout)?)
        .bind(prefs.theme.as_str())
        .bind(i64::from(prefs.refresh_interval))
        .bind(format_timestamp(&Utc::now()))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}

/// PostgreSQL implementation of PreferencesRepository.
pub struct PgPreferencesRepository {
    pool: sqlx::PgPool,
}

impl PgPreferencesRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferencesRepository for PgPreferencesRepository {
    async fn get(&self, user_id: i64) -> Result<Option<UserPreferences>, DbError> {
        let row: Option<PgPreferencesRow> = sqlx::query_as(
            r#"
            SELECT user_id, visible_widgets, dashboard_layout, theme, refresh_interval, updated_at
            FROM user_preferences WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn save(&self, prefs: &UserPreferences) -> Result<UserPreferences, DbError> {
        let refresh_interval = i32::try_from(prefs.refresh_interval).map_err(|_| {
            DbError::Serialization(format!(
                "Refresh interval out of range: {}",
                prefs.refresh_interval
            ))
        })?;

        let row: PgPreferencesRow = sqlx::query_as(
            r#"
            INSERT INTO user_preferences (user_id, visible_widgets, dashboard_layout, theme, refresh_interval, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(user_id) DO UPDATE SET
                visible_widgets = EXCLUDED.visible_widgets,
                dashboard_layout = EXCLUDED.dashboard_layout,
                theme = EXCLUDED.theme,
                refresh_interval = EXCLUDED.refresh_interval,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, visible_widgets, dashboard_layout, theme, refresh_interval, updated_at
            "#,
        )
        .bind(prefs.user_id)
        .bind(serde_json::to_string(&prefs.visible_widgets)?)
        .bind(serde_json::to_string(&prefs.dashboard_layout)?)
        .bind(prefs.theme.as_str())
        .bind(refresh_interval)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}

/// Creates a preferences repository based on the pool type.
pub fn create_preferences_repository(pool: &DbPool) -> Box<dyn PreferencesRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqlitePreferencesRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgPreferencesRepository::new(pool.clone())),
    }
}

#[derive(sqlx::FromRow)]
struct SqlitePreferencesRow {
    user_id: i64,
    visible_widgets: String,
    dashboard_layout: String,
    theme: String,
    refresh_interval: i64,
    updated_at: String,
}

impl TryFrom<SqlitePreferencesRow> for UserPreferences {
    type Error = DbError;

    fn try_from(row: SqlitePreferencesRow) -> Result<Self, Self::Error> {
        build_preferences(
            row.user_id,
            &row.visible_widgets,
            &row.dashboard_layout,
            &row.theme,
            row.refresh_interval,
            parse_timestamp(&row.updated_at)?,
        )
    }
}

#[derive(sqlx::FromRow)]
struct PgPreferencesRow {
    user_id: i64,
    visible_widgets: String,
    dashboard_layout: String,
    theme: String,
    refresh_interval: i32,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PgPreferencesRow> for UserPreferences {
    type Error = DbError;

    fn try_from(row: PgPreferencesRow) -> Result<Self, Self::Error> {
        build_preferences(
            row.user_id,
            &row.visible_widgets,
            &row.dashboard_layout,
            &row.theme,
            i64::from(row.refresh_interval),
            row.updated_at,
        )
    }
}

fn build_preferences(
    user_id: i64,
    widgets_json: &str,
    layout_json: &str,
    theme: &str,
    refresh_interval: i64,
    updated_at: DateTime<Utc>,
) -> Result<UserPreferences, DbError> {
    let visible_widgets: Vec<Widget> = serde_json::from_str(widgets_json)?;
    let dashboard_layout: Vec<LayoutItem> = serde_json::from_str(layout_json)?;
    let theme = theme.parse::<Theme>().map_err(DbError::Serialization)?;
    let refresh_interval = u32::try_from(refresh_interval).map_err(|_| {
        DbError::Serialization(format!("Invalid refresh interval: {}", refresh_interval))
    })?;

    Ok(UserPreferences {
        user_id,
        visible_widgets,
        dashboard_layout,
        theme,
        refresh_interval,
        updated_at: Some(updated_at),
    })
}
