//! Application state shared across handlers.

use soc_core::db::{create_analytics_repository, DbPool};
use soc_core::AnalyticsService;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DbPool>,
    /// Analytics aggregation over the same pool (or an injected repository).
    pub analytics: AnalyticsService,
    /// Serve zeroed analytics with `degraded: true` instead of a 500 when
    /// the store fails.
    pub degrade_on_storage_error: bool,
}

impl AppState {
    /// Creates a new application state backed by `db`.
    pub fn new(db: DbPool) -> Self {
        let analytics = AnalyticsService::new(Arc::from(create_analytics_repository(&db)));
        Self {
            db: Arc::new(db),
            analytics,
            degrade_on_storage_error: false,
        }
    }

    /// Replaces the analytics service, e.g. with one over a mock repository.
    pub fn with_analytics(mut self, analytics: AnalyticsService) -> Self {
        self.analytics = analytics;
        self
    }

    /// Enables or disables degraded analytics responses.
    pub fn with_degraded_analytics(mut self, enabled: bool) -> Self {
        self.degrade_on_storage_error = enabled;
        self
    }
}
