//! Database layer for the SOC dashboard.
//!
//! Persistence for users, incidents, analyst metrics, training records and
//! dashboard preferences using SQLx with support for both SQLite
//! (development) and PostgreSQL (production). Each aggregate has a
//! repository trait, one implementation per backend, and a
//! `create_*_repository` factory that picks the implementation from the
//! [`DbPool`] variant.

mod error;
pub mod mocks;
mod pool;
mod schema;

pub mod analyst_metrics_repo;
pub mod analytics_repo;
pub mod incident_repo;
pub mod preferences_repo;
pub mod seed;
pub mod training_repo;
pub mod user_repo;

pub use error::DbError;
pub use pool::{create_pool, create_pool_with_options, DbPool, PoolOptions};
pub use schema::run_migrations;

// Re-export repository traits
pub use analyst_metrics_repo::AnalystMetricsRepository;
pub use analytics_repo::AnalyticsRepository;
pub use incident_repo::{IncidentRepository, LifecycleUpdate};
pub use preferences_repo::PreferencesRepository;
pub use training_repo::TrainingRepository;
pub use user_repo::UserRepository;

// Re-export factory functions
pub use analyst_metrics_repo::create_analyst_metrics_repository;
pub use analytics_repo::create_analytics_repository;
pub use incident_repo::create_incident_repository;
pub use preferences_repo::create_preferences_repository;
pub use training_repo::create_training_repository;
pub use user_repo::create_user_repository;

pub use seed::{ensure_admin_user, seed_demo_data, SeedSummary};

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp for a SQLite TEXT column.
///
/// Fixed precision keeps lexicographic order equal to chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp read from a SQLite TEXT column.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Serialization(format!("Invalid timestamp '{}': {}", s, e)))
}

pub(crate) fn parse_optional_timestamp(s: Option<String>) -> Result<Option<DateTime<Utc>>, DbError> {
    s.as_deref().map(parse_timestamp).transpose()
}
