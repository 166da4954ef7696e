//! Mock implementations of repository traits for testing.
//!
//! These mocks use in-memory storage and do not require a database connection.

mod analytics_repo;

pub use analytics_repo::MockAnalyticsRepository;
