//! Prometheus Metrics Module
//!
//! Provides repository-level metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Database query duration histograms by operation and table
//! - Staging clip claim outcomes
//! - Database connection pool gauges
//! - Rows touched by maintenance sweeps

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Database query duration histogram
pub static DB_QUERY_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];
    HistogramVec::new(
        HistogramOpts::new(
            "db_query_duration_seconds",
            "Database query latency in seconds",
        )
        .namespace("clip_repository")
        .buckets(buckets),
        &["operation", "table"],
    )
    .expect("Failed to create DB_QUERY_DURATION_SECONDS metric")
});

/// Claim attempts by outcome
pub static STAGING_CLAIMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("staging_claims_total", "Discovery clip claim attempts")
            .namespace("clip_repository"),
        &["outcome"], // "claimed", "lost"
    )
    .expect("Failed to create STAGING_CLAIMS_TOTAL metric")
});

/// Database connection pool stats
pub static DB_POOL_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("db_pool_connections", "Database connection pool statistics")
            .namespace("clip_repository"),
        &["state"], // "idle", "active", "max"
    )
    .expect("Failed to create DB_POOL_CONNECTIONS metric")
});

/// Rows changed by each maintenance task
pub static MAINTENANCE_ROWS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("maintenance_rows_total", "Rows changed by maintenance sweeps")
            .namespace("clip_repository"),
        &["task"], // "strikes_expired", "mirrors_deleted"
    )
    .expect("Failed to create MAINTENANCE_ROWS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("Failed to register DB_QUERY_DURATION_SECONDS");
    registry
        .register(Box::new(STAGING_CLAIMS_TOTAL.clone()))
        .expect("Failed to register STAGING_CLAIMS_TOTAL");
    registry
        .register(Box::new(DB_POOL_CONNECTIONS.clone()))
        .expect("Failed to register DB_POOL_CONNECTIONS");
    registry
        .register(Box::new(MAINTENANCE_ROWS_TOTAL.clone()))
        .expect("Failed to register MAINTENANCE_ROWS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record database query metrics
pub fn record_db_query(operation: &str, table: &str, duration_secs: f64) {
    Lazy::force(&REGISTRY);
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(duration_secs);
}

/// Helper to record the outcome of a claim attempt
pub fn record_claim(claimed: bool) {
    Lazy::force(&REGISTRY);
    STAGING_CLAIMS_TOTAL
        .with_label_values(&[if claimed { "claimed" } else { "lost" }])
        .inc();
}

/// Count rows a maintenance task changed. Zero-row sweeps still create the series.
pub fn record_maintenance(task: &str, rows: u64) {
    Lazy::force(&REGISTRY);
    MAINTENANCE_ROWS_TOTAL.with_label_values(&[task]).inc_by(rows);
}

/// Helper to update database pool stats
pub fn update_db_pool_stats(idle: u32, active: u32, max: u32) {
    Lazy::force(&REGISTRY);
    DB_POOL_CONNECTIONS
        .with_label_values(&["idle"])
        .set(idle as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["active"])
        .set(active as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["max"])
        .set(max as f64);
}
