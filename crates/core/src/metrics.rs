//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Backends (conversions, durations, scratch cleanup)
//! - Orchestrator (batch outcomes)
//! - Delivery (saved files and bytes)
//! - Feedback (failed cues and notifications)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Backend Metrics
// =============================================================================

/// Conversions total by backend and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("konverter_conversions_total", "Total file conversions"),
        &["backend", "result"], // result: "success", "failed", "unavailable"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "konverter_conversion_duration_seconds",
            "Duration of file conversions",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["backend"],
    )
    .unwrap()
});

/// Scratch files or directories that could not be removed.
pub static CLEANUP_WARNINGS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "konverter_cleanup_warnings_total",
        "Total scratch cleanup failures",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Batches total by outcome.
pub static BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("konverter_batches_total", "Total conversion batches"),
        &["result"], // "completed", "failed", "rejected"
    )
    .unwrap()
});

// =============================================================================
// Delivery Metrics
// =============================================================================

/// Deliveries total by result.
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("konverter_deliveries_total", "Total file deliveries"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Bytes handed to the user.
pub static DELIVERED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "konverter_delivered_bytes_total",
        "Total bytes of delivered files",
    )
    .unwrap()
});

// =============================================================================
// Feedback Metrics
// =============================================================================

/// Feedback failures by kind.
pub static FEEDBACK_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "konverter_feedback_failures_total",
            "Total completion cue or notification failures",
        ),
        &["kind"], // "cue", "notification"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Backends
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(CLEANUP_WARNINGS.clone()),
        // Orchestrator
        Box::new(BATCHES_TOTAL.clone()),
        // Delivery
        Box::new(DELIVERIES_TOTAL.clone()),
        Box::new(DELIVERED_BYTES.clone()),
        // Feedback
        Box::new(FEEDBACK_FAILURES.clone()),
    ]
}
