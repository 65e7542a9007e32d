//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (submissions, terminal outcomes)
//! - Pipeline stages (duration and result per stage)
//! - Publishing (attempts per channel)
//! - External services (Pexels, OpenAI, Telegram, YouTube, subprocess tools)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs accepted by the orchestrator.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("talkreel_jobs_submitted_total", "Total jobs submitted").unwrap()
});

/// Jobs that reached a terminal state.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("talkreel_jobs_finished_total", "Total jobs finished"),
        &["status"], // "completed", "failed"
    )
    .unwrap()
});

/// End-to-end job duration.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "talkreel_job_duration_seconds",
            "Duration of a pipeline run from first stage to terminal state",
        )
        .buckets(vec![
            10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 1800.0, 3600.0,
        ]),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Stage Metrics
// =============================================================================

/// Stage duration by stage and result.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "talkreel_stage_duration_seconds",
            "Duration of pipeline stages",
        )
        .buckets(vec![
            0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
        ]),
        &["stage", "result"], // result: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Publishing Metrics
// =============================================================================

/// Publish attempts by channel and result.
pub static PUBLISH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "talkreel_publish_attempts_total",
            "Total publish attempts per channel",
        ),
        &["channel", "result"],
    )
    .unwrap()
});

/// Transient files removed during cleanup.
pub static FILES_CLEANED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "talkreel_files_cleaned_total",
        "Total transient artifacts deleted by cleanup",
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "talkreel_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "talkreel_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one external call.
pub fn record_external_call(service: &str, operation: &str, success: bool, elapsed_secs: f64) {
    let status = if success { "success" } else { "error" };
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, status])
        .inc();
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(elapsed_secs);
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Stages
        Box::new(STAGE_DURATION.clone()),
        // Publishing
        Box::new(PUBLISH_ATTEMPTS.clone()),
        Box::new(FILES_CLEANED.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
