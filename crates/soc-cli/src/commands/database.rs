//! Migrate and seed commands.

use anyhow::{Context, Result};
use colored::Colorize;
use soc_core::db::{create_pool, run_migrations, seed_demo_data, DbPool, SeedSummary};

async fn connect(database_url: &str) -> Result<DbPool> {
    let pool = create_pool(database_url)
        .await
        .context("Failed to create database connection pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(pool)
}

/// Applies pending migrations.
pub async fn run_migrate(database_url: &str) -> Result<()> {
    println!("{} Running migrations...", "[db]".cyan());
    let pool = connect(database_url).await?;
    println!("  {} Schema up to date ({})", "✓".green(), pool.db_type());
    pool.close().await;
    Ok(())
}

/// Loads the demo data set.
pub async fn run_seed(database_url: &str, rng_seed: Option<u64>) -> Result<SeedSummary> {
    println!("{} Seeding demo data...", "[db]".cyan());
    let pool = connect(database_url).await?;

    let summary = seed_demo_data(&pool, rng_seed)
        .await
        .context("Failed to seed demo data")?;
    pool.close().await;

    if summary.admin_created {
        println!("  {} Created default admin user", "✓".green());
    }
    println!(
        "  {} Analysts: {} created, {} already present",
        "✓".green(),
        summary.analysts_created,
        summary.analysts_skipped
    );
    println!("  {} Incidents: {}", "✓".green(), summary.incidents_created);
    println!("  {} Metric snapshots: {}", "✓".green(), summary.metrics_written);
    println!(
        "  {} Training records: {}",
        "✓".green(),
        summary.training_records_created
    );

    Ok(summary)
}
