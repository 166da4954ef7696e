//! Database seeding utilities.
//!
//! Creates the default admin on first run and, on request, a demo data set
//! of analysts, incidents, metric snapshots and training records.

use super::{
    create_analyst_metrics_repository, create_incident_repository, create_training_repository,
    create_user_repository, DbError, DbPool,
};
use crate::incident::{IncidentStatus, NewIncident, Severity};
use crate::training::{NewTrainingRecord, TrainingStatus};
use crate::user::{AnalystMetricsUpdate, NewUser, Role, User};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Email of the default admin account.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@socdashboard.com";

const DEMO_ANALYSTS: [(&str, &str); 3] = [
    ("alice@soc.com", "Alice Johnson"),
    ("bob@soc.com", "Bob Smith"),
    ("charlie@soc.com", "Charlie Davis"),
];

const INCIDENT_TITLES: [&str; 15] = [
    "Suspicious login from unknown IP",
    "Malware detected on endpoint",
    "Unauthorized access attempt",
    "Data exfiltration alert",
    "Phishing email detected",
    "DDoS attack in progress",
    "Privilege escalation attempt",
    "Brute force attack detected",
    "Ransomware signature found",
    "SQL injection attempt",
    "Cross-site scripting detected",
    "Certificate expiration warning",
    "Firewall rule violation",
    "Unusual network traffic",
    "Failed backup detected",
];

/// (incidents_handled, avg_response_time, success_rate, skill_level) per demo analyst.
const DEMO_METRICS: [(i64, f64, f64, i32); 3] = [
    (45, 22.0, 92.0, 4),
    (38, 28.0, 88.0, 3),
    (52, 18.0, 95.0, 5),
];

/// What a seeding run created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub admin_created: bool,
    pub analysts_created: usize,
    pub analysts_skipped: usize,
    pub incidents_created: usize,
    pub metrics_written: usize,
    pub training_records_created: usize,
}

/// Ensures a default admin user exists in the database.
///
/// Returns the new admin if one was created, `None` if any user already
/// exists.
pub async fn ensure_admin_user(pool: &DbPool) -> Result<Option<User>, DbError> {
    let user_repo = create_user_repository(pool);

    if user_repo.any_exist().await? {
        info!("Users already exist, skipping admin seed");
        return Ok(None);
    }

    let admin = user_repo
        .create(&NewUser::new(DEFAULT_ADMIN_EMAIL, "Administrator", Role::Admin))
        .await?;

    info!(email = DEFAULT_ADMIN_EMAIL, "Created default admin user");
    Ok(Some(admin))
}

/// Seeds demo analysts, incidents, metric snapshots and training records.
///
/// Analysts that already exist are reused rather than recreated. Passing
/// `rng_seed` makes the generated incidents reproducible.
pub async fn seed_demo_data(pool: &DbPool, rng_seed: Option<u64>) -> Result<SeedSummary, DbError> {
    let mut rng = match rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut summary = SeedSummary {
        admin_created: ensure_admin_user(pool).await?.is_some(),
        ..Default::default()
    };

    let users = create_user_repository(pool);
    let mut analyst_ids = Vec::with_capacity(DEMO_ANALYSTS.len());
    for (email, name) in DEMO_ANALYSTS {
        match users.get_by_email(email).await? {
            Some(existing) => {
                debug!(email, "Analyst already exists");
                summary.analysts_skipped += 1;
                analyst_ids.push(existing.id);
            }
            None => {
                let created = users.create(&NewUser::new(email, name, Role::Analyst)).await?;
                info!(email, "Created analyst");
                summary.analysts_created += 1;
                analyst_ids.push(created.id);
            }
        }
    }

    let incidents = create_incident_repository(pool);
    for (i, title) in INCIDENT_TITLES.iter().enumerate() {
        let incident = random_incident(&mut rng, title, analyst_ids[i % analyst_ids.len()]);
        incidents.create(&incident).await?;
        summary.incidents_created += 1;
    }
    info!(count = summary.incidents_created, "Created demo incidents");

    let metrics = create_analyst_metrics_repository(pool);
    for (user_id, (handled, response, rate, skill)) in analyst_ids.iter().zip(DEMO_METRICS) {
        metrics
            .upsert(
                *user_id,
                &AnalystMetricsUpdate {
                    incidents_handled: handled,
                    avg_response_time: response,
                    success_rate: rate,
                    skill_level: skill,
                },
            )
            .await?;
        summary.metrics_written += 1;
    }

    let training = create_training_repository(pool);
    for record in demo_training(&analyst_ids) {
        training.create(&record).await?;
        summary.training_records_created += 1;
    }

    info!(?summary, "Demo data seeding complete");
    Ok(summary)
}

fn random_incident(rng: &mut StdRng, title: &str, assignee: i64) -> NewIncident {
    let detected_at = Utc::now() - Duration::seconds(rng.gen_range(0..30 * 24 * 60 * 60));
    let detection_time = rng.gen_range(5..125);
    let response_time = rng.gen_range(10..190);
    let resolution_time = rng.gen_range(30..330);

    let status = IncidentStatus::ALL[rng.gen_range(0..IncidentStatus::ALL.len())];
    let severity = Severity::ALL[rng.gen_range(0..Severity::ALL.len())];

    let responded_at = detected_at + Duration::minutes(response_time);
    let resolved = status.is_terminal();

    NewIncident {
        title: title.to_string(),
        severity,
        status,
        assigned_to: Some(assignee),
        detected_at: Some(detected_at),
        responded_at: Some(responded_at),
        resolved_at: resolved.then(|| responded_at + Duration::minutes(resolution_time)),
        detection_time: Some(detection_time),
        response_time: Some(response_time),
        resolution_time: resolved.then_some(resolution_time),
    }
}

fn demo_training(analyst_ids: &[i64]) -> Vec<NewTrainingRecord> {
    let now = Utc::now();
    let courses = [
        ("Incident Response Fundamentals", Some("GCIH"), TrainingStatus::Completed, Some(91)),
        ("Threat Hunting with SIEM", None, TrainingStatus::InProgress, None),
        ("Network Forensics", Some("GNFA"), TrainingStatus::Expired, Some(78)),
    ];

    analyst_ids
        .iter()
        .zip(courses)
        .map(|(user_id, (course, cert, status, score))| {
            let completed_at = match status {
                TrainingStatus::InProgress => None,
                TrainingStatus::Completed => Some(now - Duration::days(60)),
                TrainingStatus::Expired => Some(now - Duration::days(3 * 365)),
            };
            NewTrainingRecord {
                user_id: *user_id,
                course_name: course.to_string(),
                certification_name: cert.map(str::to_string),
                status,
                score,
                completed_at,
                expires_at: completed_at.map(|at| at + Duration::days(2 * 365)),
            }
        })
        .collect()
}
