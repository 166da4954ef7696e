//! CLI command implementations.

pub mod database;
pub mod serve;

pub use database::{run_migrate, run_seed};
pub use serve::{run_server, ServeConfig};
