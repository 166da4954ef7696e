//! SOC Dashboard CLI
//!
//! Runs the analytics and preferences API and manages its database.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod config;

use commands::{run_migrate, run_seed, run_server, ServeConfig};
use config::AppConfig;
use soc_observability::{init_logging_with_config, LogFormat};

#[derive(Parser)]
#[command(name = "soc-dashboard")]
#[command(author = "SOC Dashboard Team")]
#[command(version)]
#[command(about = "Incident analytics and dashboard preferences for a SOC", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Database URL (sqlite: or postgres://), overrides the config file
    #[arg(short, long, env = "DATABASE_URL", global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Disable Swagger UI
        #[arg(long)]
        no_swagger: bool,

        /// Serve empty analytics flagged as degraded when the database fails
        #[arg(long)]
        degraded_analytics: bool,

        /// Validate configuration and exit without starting the server
        #[arg(long)]
        validate_only: bool,
    },

    /// Apply database migrations
    Migrate,

    /// Load demo analysts, incidents, metrics and training records
    Seed {
        /// RNG seed for reproducible incidents
        #[arg(long)]
        rng_seed: Option<u64>,
    },

    /// Show current configuration
    Config {
        /// Show secrets (redacted by default)
        #[arg(long)]
        show_secrets: bool,

        /// Write the effective configuration to the config file path
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    if let Some(url) = &cli.database {
        config.database.url = url.clone();
    }

    init_cli_logging(&cli, &config)?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            no_swagger,
            degraded_analytics,
            validate_only,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if no_swagger {
                config.server.enable_swagger = false;
            }
            if degraded_analytics {
                config.analytics.degrade_on_storage_error = true;
            }
            cmd_serve(config, validate_only).await
        }
        Commands::Migrate => run_migrate(&config.database.url).await,
        Commands::Seed { rng_seed } => {
            let summary = run_seed(&config.database.url, rng_seed).await?;
            if cli.format == OutputFormat::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "admin_created": summary.admin_created,
                        "analysts_created": summary.analysts_created,
                        "analysts_skipped": summary.analysts_skipped,
                        "incidents_created": summary.incidents_created,
                        "metrics_written": summary.metrics_written,
                        "training_records_created": summary.training_records_created,
                    })
                );
            }
            Ok(())
        }
        Commands::Config { show_secrets, init } => {
            if init {
                let path = cli.config.clone().unwrap_or_else(config::default_config_path);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create config directory: {}", parent.display())
                    })?;
                }
                config.save(&path)?;
                println!("{} Wrote {}", "✓".green(), path.display());
                return Ok(());
            }
            cmd_config(config, show_secrets, cli.format)
        }
    }
}

fn init_cli_logging(cli: &Cli, config: &AppConfig) -> Result<()> {
    let mut settings = config
        .logging
        .to_settings()
        .map_err(anyhow::Error::msg)
        .context("Invalid logging configuration")?;
    if cli.verbose {
        settings.level = tracing::Level::DEBUG;
    }
    if cli.format == OutputFormat::Json {
        settings.format = LogFormat::Json;
    }
    init_logging_with_config(settings).context("Failed to initialize logging")
}

async fn cmd_serve(config: AppConfig, validate_only: bool) -> Result<()> {
    println!("{}", "Validating configuration...".cyan());

    let errors = config.validate();
    for error in &errors {
        println!("  {} {}", "✗".red(), error);
    }

    if !errors.is_empty() {
        println!();
        println!(
            "{}",
            "Configuration validation failed. Fix the errors above and try again."
                .red()
                .bold()
        );
        bail!("{} configuration error(s)", errors.len());
    }

    println!("  {} Configuration is valid", "✓".green());
    if validate_only {
        return Ok(());
    }

    println!();
    run_server(ServeConfig::from_app_config(&config)).await
}

fn cmd_config(config: AppConfig, show_secrets: bool, format: OutputFormat) -> Result<()> {
    let config = if show_secrets {
        config
    } else {
        config.redact_secrets()
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", "Current Configuration".bold());
        println!("─────────────────────");
        println!("{}", serde_yaml::to_string(&config)?);
    }

    Ok(())
}
