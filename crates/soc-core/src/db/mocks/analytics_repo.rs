//! Mock implementation of AnalyticsRepository for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::analytics::{AnalystPerformance, AnalyticsOverview, RecentIncident, TrainingRecordView};
use crate::db::{AnalyticsRepository, DbError};

#[derive(Default)]
struct Fixtures {
    overview: AnalyticsOverview,
    performance: Vec<AnalystPerformance>,
    recent: Vec<RecentIncident>,
    training: Vec<TrainingRecordView>,
}

/// Mock implementation of AnalyticsRepository returning canned results.
///
/// [`MockAnalyticsRepository::set_failing`] makes every query fail with a
/// connection error, for exercising storage-failure paths.
pub struct MockAnalyticsRepository {
    fixtures: Fixtures,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl Default for MockAnalyticsRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnalyticsRepository {
    /// Creates a mock with an empty store.
    pub fn new() -> Self {
        Self {
            fixtures: Fixtures::default(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a mock whose queries all fail.
    pub fn failing() -> Self {
        let mock = Self::new();
        mock.set_failing(true);
        mock
    }

    pub fn with_overview(mut self, overview: AnalyticsOverview) -> Self {
        self.fixtures.overview = overview;
        self
    }

    pub fn with_performance(mut self, rows: Vec<AnalystPerformance>) -> Self {
        self.fixtures.performance = rows;
        self
    }

    /// Rows must already be ordered newest first.
    pub fn with_recent_incidents(mut self, rows: Vec<RecentIncident>) -> Self {
        self.fixtures.recent = rows;
        self
    }

    pub fn with_training(mut self, rows: Vec<TrainingRecordView>) -> Self {
        self.fixtures.training = rows;
        self
    }

    /// Toggles failure injection.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of queries received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::Connection("mock storage unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AnalyticsRepository for MockAnalyticsRepository {
    async fn overview(&self) -> Result<AnalyticsOverview, DbError> {
        self.enter()?;
        Ok(self.fixtures.overview.clone())
    }

    async fn analyst_performance(
        &self,
        analyst_id: Option<i64>,
    ) -> Result<Vec<AnalystPerformance>, DbError> {
        self.enter()?;
        Ok(self
            .fixtures
            .performance
            .iter()
            .filter(|row| analyst_id.map_or(true, |id| row.id == id))
            .cloned()
            .collect())
    }

    async fn recent_incidents(&self, limit: u32) -> Result<Vec<RecentIncident>, DbError> {
        self.enter()?;
        Ok(self.fixtures.recent.iter().take(limit as usize).cloned().collect())
    }

    async fn training_records(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<TrainingRecordView>, DbError> {
        self.enter()?;
        Ok(self
            .fixtures
            .training
            .iter()
            .filter(|row| user_id.map_or(true, |id| row.record.user_id == id))
            .cloned()
            .collect())
    }
}
