//! # Clip Maintenance
//!
//! One-shot maintenance job for the clip platform database.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool
//!
//! and then runs a single maintenance pass before exiting.

use anyhow::Result;
use tracing::info;

use clip_repository::config::Settings;
use clip_repository::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;

    // Structured JSON logs in production, human-readable otherwise
    if settings.environment == "production" {
        clip_repository::telemetry::init_json_tracing();
    } else {
        clip_repository::telemetry::init_tracing();
    }

    info!(environment = %settings.environment, "Configuration loaded");

    let application = Application::build(settings).await?;
    let report = application.run_maintenance().await?;

    info!(
        strikes_expired = report.strikes_expired,
        mirrors_deleted = report.mirrors_deleted,
        counter_notices_awaiting_restore = report.counter_notices_awaiting_restore,
        mirror_candidates = report.mirror_candidates,
        "Maintenance finished"
    );

    // Nothing scrapes a one-shot job, so the counters go to the log
    info!(metrics = %application.metrics_snapshot(), "Metrics snapshot");

    Ok(())
}
