//! Serve command - starts the API server.

use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;
use std::time::Duration;

use soc_api::{ApiServer, ApiServerConfig, AppState};
use soc_core::db::{create_pool, ensure_admin_user, run_migrations};

use crate::config::AppConfig;

/// Server settings after CLI flags are applied over the config file.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub enable_swagger: bool,
    pub timeout_secs: u64,
    pub degrade_on_storage_error: bool,
}

impl ServeConfig {
    /// Takes every value from the config file.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            port: config.server.port,
            host: config.server.host.clone(),
            database_url: config.database.url.clone(),
            enable_swagger: config.server.enable_swagger,
            timeout_secs: config.server.request_timeout_secs,
            degrade_on_storage_error: config.analytics.degrade_on_storage_error,
        }
    }

    fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// Runs the API server.
pub async fn run_server(config: ServeConfig) -> Result<()> {
    println!("{} Starting SOC Dashboard API Server...", "[server]".cyan());

    let bind_address = config.bind_address()?;

    let db_pool = create_pool(&config.database_url)
        .await
        .context("Failed to create database connection pool")?;
    println!("  {} Database: {}", "→".green(), db_pool.db_type());

    println!("  {} Running migrations...", "→".green());
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    println!("  {} Migrations complete", "✓".green());

    if let Some(admin) = ensure_admin_user(&db_pool)
        .await
        .context("Failed to create default admin user")?
    {
        println!("  {} Created admin user {}", "✓".green(), admin.email);
    }

    let state = AppState::new(db_pool);
    let server_config = ApiServerConfig {
        bind_address,
        request_timeout: Duration::from_secs(config.timeout_secs),
        enable_swagger: config.enable_swagger,
        degrade_on_storage_error: config.degrade_on_storage_error,
    };

    println!();
    println!("{}", "SOC Dashboard API Server".bold());
    println!("{}", "═".repeat(40));
    println!("  {} http://{}", "Address:".cyan(), bind_address);
    if config.enable_swagger {
        println!("  {} http://{}/swagger-ui", "Swagger UI:".cyan(), bind_address);
    }
    if config.degrade_on_storage_error {
        println!("  {} degraded analytics on storage errors", "Mode:".cyan());
    }

    println!();
    println!("{}", "Endpoints:".bold());
    println!("  GET   /health                        - Health check");
    println!("  GET   /api/analytics?type=...        - Analytics reports");
    println!("  GET   /api/preferences?userId=...    - Read preferences");
    println!("  POST  /api/preferences               - Save preferences");
    println!("  POST  /api/users                     - Create user");
    println!("  POST  /api/incidents                 - Create incident");
    println!("  PATCH /api/incidents/:id/status      - Change incident status");
    println!("  PUT   /api/analysts/:id/metrics      - Update analyst metrics");
    println!("  POST  /api/training                  - Record training");
    println!();
    println!("Press {} to stop", "Ctrl+C".yellow());
    println!();

    ApiServer::new(state, server_config)
        .run()
        .await
        .context("Server error")?;

    println!();
    println!("{} Server stopped", "[server]".cyan());

    Ok(())
}
