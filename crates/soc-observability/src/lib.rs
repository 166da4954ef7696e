//! # soc-observability
//!
//! Structured logging for the SOC dashboard services, built on `tracing`.

pub mod logging;

pub use logging::{init_logging, init_logging_with_config, LogFormat, LoggingConfig};
