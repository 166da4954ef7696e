//! Integration test modules.

pub mod admin_tests;
pub mod analytics_tests;
pub mod common;
pub mod health_tests;
pub mod preferences_tests;
