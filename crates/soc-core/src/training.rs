//! Analyst training and certification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

/// Progress of a training course.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    InProgress,
    Completed,
    Expired,
}

impl TrainingStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TrainingStatus::InProgress => "in_progress",
            TrainingStatus::Completed => "completed",
            TrainingStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for TrainingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(TrainingStatus::InProgress),
            "completed" => Ok(TrainingStatus::Completed),
            "expired" => Ok(TrainingStatus::Expired),
            other => Err(format!("Unknown training status: {}", other)),
        }
    }
}

/// A stored training record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TrainingRecord {
    pub id: i64,
    pub user_id: i64,
    pub course_name: String,
    pub certification_name: Option<String>,
    pub status: TrainingStatus,
    /// Score in `0..=100`.
    pub score: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a training record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewTrainingRecord {
    pub user_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub course_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub certification_name: Option<String>,
    pub status: TrainingStatus,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Score must be between 0 and 100"))]
    pub score: Option<i32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}
