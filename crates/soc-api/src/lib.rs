//! REST API for the SOC dashboard.
//!
//! Serves the incident analytics reports, per-user dashboard preferences,
//! and the small admin surface used to populate incidents, analysts and
//! training records. Routes are mounted under both `/api/v1` and `/api`.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use server::{ApiDoc, ApiServer, ApiServerConfig};
pub use state::AppState;
