//! Users, roles and analyst metric snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

/// User roles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrators are never counted as analysts.
    Admin,
    /// Assignable SOC analyst.
    Analyst,
    /// Regular dashboard user.
    #[default]
    User,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Analyst => "analyst",
            Role::User => "user",
        }
    }

    /// Returns true if users with this role appear in analyst reports.
    pub fn is_analyst(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "analyst" => Ok(Role::Analyst),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

/// A user of the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Display name.
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Request to create a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

impl NewUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            role,
        }
    }
}

/// Stored performance snapshot for one analyst.
///
/// This row is written by an explicit update and is never derived from
/// incidents, so `incidents_handled` can drift from the live count of
/// closed incidents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AnalystMetrics {
    pub user_id: i64,
    pub incidents_handled: i64,
    /// Average response time in minutes.
    pub avg_response_time: f64,
    /// Percentage in `0..=100`.
    pub success_rate: f64,
    /// Skill level in `1..=5`.
    pub skill_level: i32,
    pub updated_at: DateTime<Utc>,
}

/// Values for an analyst metrics upsert.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AnalystMetricsUpdate {
    #[validate(range(min = 0))]
    pub incidents_handled: i64,
    #[validate(range(min = 0.0))]
    pub avg_response_time: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub success_rate: f64,
    #[validate(range(min = 1, max = 5))]
    pub skill_level: i32,
}
