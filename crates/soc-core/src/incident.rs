//! Incident data models and the status state machine.
//!
//! Incidents are created by seed or admin operations and then move through
//! `open -> investigating -> {resolved, closed}`. Status strings read from
//! storage are parsed into [`IncidentStatus`]; anything else is rejected on
//! write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

/// Errors raised by incident validation and status transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncidentError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: IncidentStatus,
        to: IncidentStatus,
    },

    #[error("Unknown incident status: {0}")]
    UnknownStatus(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

/// Severity levels for incidents.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Returns the value stored in the `severity` column.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for Severity {
    type Err = IncidentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(IncidentError::UnknownSeverity(other.to_string())),
        }
    }
}

/// Status of an incident.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    /// Detected, nobody has responded yet.
    Open,
    /// An analyst is working on it.
    Investigating,
    /// Root cause handled.
    Resolved,
    /// Closed, no further work.
    Closed,
}

/// Statuses counted as open by the analytics overview.
pub const OPEN_STATUSES: [IncidentStatus; 2] =
    [IncidentStatus::Open, IncidentStatus::Investigating];

/// Statuses counted as closed by the analytics overview.
pub const CLOSED_STATUSES: [IncidentStatus; 2] =
    [IncidentStatus::Resolved, IncidentStatus::Closed];

impl IncidentStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [IncidentStatus; 4] = [
        IncidentStatus::Open,
        IncidentStatus::Investigating,
        IncidentStatus::Resolved,
        IncidentStatus::Closed,
    ];

    /// Returns the value stored in the `status` column.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "open",
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Closed => "closed",
        }
    }

    /// Returns true for resolved and closed.
    pub fn is_terminal(&self) -> bool {
        CLOSED_STATUSES.contains(self)
    }

    /// Returns true if the state machine permits moving from `self` to `to`.
    pub fn can_transition_to(&self, to: IncidentStatus) -> bool {
        use IncidentStatus::*;
        matches!(
            (self, to),
            (Open, Investigating)
                | (Open, Resolved)
                | (Open, Closed)
                | (Investigating, Resolved)
                | (Investigating, Closed)
                | (Resolved, Closed)
        )
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = IncidentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(IncidentStatus::Open),
            "investigating" => Ok(IncidentStatus::Investigating),
            "resolved" => Ok(IncidentStatus::Resolved),
            "closed" => Ok(IncidentStatus::Closed),
            other => Err(IncidentError::UnknownStatus(other.to_string())),
        }
    }
}

/// A stored security incident.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Incident {
    pub id: i64,
    pub title: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    /// User id of the assigned analyst.
    pub assigned_to: Option<i64>,
    pub detected_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Minutes from the triggering event to detection.
    pub detection_time: Option<i64>,
    /// Minutes from detection to first response.
    pub response_time: Option<i64>,
    /// Minutes from first response to close.
    pub resolution_time: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Moves the incident to `to`, stamping lifecycle timestamps.
    ///
    /// Entering any state past `open` records the first response if none
    /// exists yet; entering `resolved` or `closed` records the resolution.
    pub fn transition(&mut self, to: IncidentStatus, now: DateTime<Utc>) -> Result<(), IncidentError> {
        if !self.status.can_transition_to(to) {
            return Err(IncidentError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        if self.responded_at.is_none() {
            self.responded_at = Some(now);
            self.response_time = Some(minutes_between(self.detected_at, now));
        }

        if to.is_terminal() && self.resolved_at.is_none() {
            let start = self.responded_at.unwrap_or(self.detected_at);
            self.resolved_at = Some(now);
            self.resolution_time = Some(minutes_between(start, now));
        }

        self.status = to;
        Ok(())
    }
}

/// Whole minutes between two instants, clamped at zero.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Request to create an incident.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewIncident {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub severity: Severity,
    #[serde(default = "default_status")]
    pub status: IncidentStatus,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    /// Defaults to the time of creation.
    #[serde(default)]
    pub detected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub detection_time: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub response_time: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub resolution_time: Option<i64>,
}

fn default_status() -> IncidentStatus {
    IncidentStatus::Open
}

impl NewIncident {
    /// Creates an open incident detected now.
    pub fn new(title: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            severity,
            status: IncidentStatus::Open,
            assigned_to: None,
            detected_at: None,
            responded_at: None,
            resolved_at: None,
            detection_time: None,
            response_time: None,
            resolution_time: None,
        }
    }

    /// Checks the cross-field invariants of an incident.
    pub fn check_invariants(&self) -> Result<(), IncidentError> {
        if self.response_time.is_some() && self.responded_at.is_none() {
            return Err(IncidentError::Invariant(
                "response_time requires responded_at".to_string(),
            ));
        }
        if self.resolution_time.is_some() && !self.status.is_terminal() {
            return Err(IncidentError::Invariant(format!(
                "resolution_time is only allowed for resolved or closed incidents, status is {}",
                self.status
            )));
        }
        if self.resolved_at.is_some() && !self.status.is_terminal() {
            return Err(IncidentError::Invariant(format!(
                "resolved_at is only allowed for resolved or closed incidents, status is {}",
                self.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_incident(detected_at: DateTime<Utc>) -> Incident {
        Incident {
            id: 1,
            title: "Brute force attack detected".to_string(),
            severity: Severity::High,
            status: IncidentStatus::Open,
            assigned_to: None,
            detected_at,
            responded_at: None,
            resolved_at: None,
            detection_time: Some(12),
            response_time: None,
            resolution_time: None,
            created_at: detected_at,
        }
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in IncidentStatus::ALL {
            assert_eq!(status.as_db_str().parse::<IncidentStatus>(), Ok(status));
        }
        assert_eq!(
            "triaged".parse::<IncidentStatus>(),
            Err(IncidentError::UnknownStatus("triaged".to_string()))
        );
    }

    #[test]
    fn test_severity_parse_rejects_unknown() {
        assert_eq!("critical".parse::<Severity>(), Ok(Severity::Critical));
        assert!("info".parse::<Severity>().is_err());
    }

    #[test]
    fn test_transition_table() {
        use IncidentStatus::*;
        assert!(Open.can_transition_to(Investigating));
        assert!(Open.can_transition_to(Closed));
        assert!(Investigating.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Closed));

        assert!(!Investigating.can_transition_to(Open));
        assert!(!Resolved.can_transition_to(Investigating));
        assert!(!Open.can_transition_to(Open));
        for to in IncidentStatus::ALL {
            assert!(!Closed.can_transition_to(to), "closed must be terminal");
        }
    }

    #[test]
    fn test_transition_stamps_response() {
        let detected = Utc::now() - Duration::minutes(45);
        let mut incident = open_incident(detected);
        let now = detected + Duration::minutes(30);

        incident.transition(IncidentStatus::Investigating, now).unwrap();

        assert_eq!(incident.status, IncidentStatus::Investigating);
        assert_eq!(incident.responded_at, Some(now));
        assert_eq!(incident.response_time, Some(30));
        assert!(incident.resolved_at.is_none());
        assert!(incident.resolution_time.is_none());
    }

    #[test]
    fn test_transition_stamps_resolution_from_response() {
        let detected = Utc::now() - Duration::hours(3);
        let mut incident = open_incident(detected);
        let responded = detected + Duration::minutes(20);
        incident.transition(IncidentStatus::Investigating, responded).unwrap();

        let resolved = responded + Duration::minutes(95);
        incident.transition(IncidentStatus::Resolved, resolved).unwrap();

        assert_eq!(incident.resolved_at, Some(resolved));
        assert_eq!(incident.resolution_time, Some(95));
        // The first response is not overwritten.
        assert_eq!(incident.response_time, Some(20));
    }

    #[test]
    fn test_invalid_transition_leaves_incident_untouched() {
        let detected = Utc::now();
        let mut incident = open_incident(detected);
        incident.status = IncidentStatus::Closed;
        let before = incident.clone();

        let err = incident
            .transition(IncidentStatus::Investigating, detected)
            .unwrap_err();

        assert_eq!(
            err,
            IncidentError::InvalidTransition {
                from: IncidentStatus::Closed,
                to: IncidentStatus::Investigating
            }
        );
        assert_eq!(incident, before);
    }

    #[test]
    fn test_new_incident_invariants() {
        let mut incident = NewIncident::new("Phishing email detected", Severity::Medium);
        assert!(incident.check_invariants().is_ok());

        incident.response_time = Some(15);
        assert!(incident.check_invariants().is_err());
        incident.responded_at = Some(Utc::now());
        assert!(incident.check_invariants().is_ok());

        incident.resolution_time = Some(60);
        assert!(incident.check_invariants().is_err());
        incident.status = IncidentStatus::Closed;
        assert!(incident.check_invariants().is_ok());
    }

    #[test]
    fn test_new_incident_deserialize_defaults_to_open() {
        let incident: NewIncident =
            serde_json::from_str(r#"{"title":"DDoS attack in progress","severity":"critical"}"#)
                .unwrap();
        assert_eq!(incident.status, IncidentStatus::Open);
        assert!(incident.detected_at.is_none());
    }

    #[test]
    fn test_minutes_between_clamps_negative() {
        let now = Utc::now();
        assert_eq!(minutes_between(now, now - Duration::minutes(5)), 0);
        assert_eq!(minutes_between(now, now + Duration::minutes(5)), 5);
    }
}
