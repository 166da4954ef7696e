//! # soc-core
//!
//! Data models, persistence and analytics aggregation for the SOC dashboard.
//!
//! This crate provides the incident, user, training and preference models,
//! the incident status state machine, the SQLite/PostgreSQL repositories and
//! the analytics service that powers the dashboard reports.

pub mod analytics;
pub mod db;
pub mod incident;
pub mod preferences;
pub mod training;
pub mod user;

pub use analytics::{
    AnalystPerformance, AnalyticsError, AnalyticsOverview, AnalyticsService, RecentIncident,
    Report, ReportRequest, ReportType, TrainingRecordView,
};
pub use incident::{Incident, IncidentError, IncidentStatus, NewIncident, Severity};
pub use preferences::{LayoutItem, PreferencesUpdate, Theme, UserPreferences, Widget};
pub use training::{NewTrainingRecord, TrainingRecord, TrainingStatus};
pub use user::{AnalystMetrics, AnalystMetricsUpdate, NewUser, Role, User};
