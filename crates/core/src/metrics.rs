//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sync cycles (results, durations)
//! - Reconciled items (created, updated, skipped, failed)
//! - Provider requests

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

// =============================================================================
// Sync cycles
// =============================================================================

/// Sync cycles total by result.
pub static SYNC_CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("showsync_cycles_total", "Total sync cycles"),
        &["result"], // "completed", "empty", "commit_failed", "error"
    )
    .unwrap()
});

/// Sync cycle duration in seconds.
pub static SYNC_CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "showsync_cycle_duration_seconds",
            "Duration of sync cycles",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

/// Reconciled items total by outcome.
pub static SYNC_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("showsync_items_total", "Total reconciled provider shows"),
        &["outcome"], // "created", "updated", "skipped", "failed"
    )
    .unwrap()
});

/// Whether the scheduler loop is running (1) or not (0).
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("showsync_scheduler_running", "Sync scheduler running").unwrap()
});

// =============================================================================
// Provider
// =============================================================================

/// Provider requests total by operation and status.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("showsync_provider_requests_total", "Total provider requests"),
        &["operation", "status"], // operation: "page", "detail"; status: "success", "error"
    )
    .unwrap()
});

/// Provider request duration in seconds.
pub static PROVIDER_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "showsync_provider_request_duration_seconds",
            "Duration of provider requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SYNC_CYCLES.clone()),
        Box::new(SYNC_CYCLE_DURATION.clone()),
        Box::new(SYNC_ITEMS.clone()),
        Box::new(SCHEDULER_RUNNING.clone()),
        Box::new(PROVIDER_REQUESTS.clone()),
        Box::new(PROVIDER_REQUEST_DURATION.clone()),
    ]
}

/// Build a registry holding every core metric.
pub fn registry() -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric)?;
    }
    Ok(registry)
}

/// Encode a registry's metrics in Prometheus text format.
pub fn encode(registry: &Registry) -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
