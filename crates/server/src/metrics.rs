//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the talkreel server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Jobs by status and active pipeline tasks (collected dynamically)
//! - Core pipeline and external service metrics, registered from the core crate

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

use talkreel_core::JobStatus;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "talkreel_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("talkreel_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "talkreel_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Jobs by current status.
pub static JOBS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("talkreel_jobs_by_status", "Current job count by status"),
        &["status"],
    )
    .unwrap()
});

/// Jobs whose pipeline task is still running.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "talkreel_jobs_active",
        "Number of jobs with a running pipeline task",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Jobs
    registry.register(Box::new(JOBS_BY_STATUS.clone())).unwrap();
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();

    // Core metrics (pipeline, publishing, external services)
    for metric in talkreel_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the job gauges reflect the store right now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.orchestrator().status().await {
        Ok(status) => {
            JOBS_ACTIVE.set(status.active_jobs.len() as i64);
            let counts = status.counts;
            for (job_status, count) in [
                (JobStatus::Pending, counts.pending),
                (JobStatus::Running, counts.running),
                (JobStatus::Completed, counts.completed),
                (JobStatus::Failed, counts.failed),
            ] {
                JOBS_BY_STATUS
                    .with_label_values(&[job_status.as_str()])
                    .set(count as i64);
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to collect job metrics"),
    }
}

static JOB_ID_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/[0-9a-f]{12}(/|$)").unwrap());
static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});
static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = JOB_ID_SEGMENT.replace_all(&result, "/{id}$1");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_job_id() {
        assert_eq!(normalize_path("/api/v1/jobs/3f2a9c01b7de"), "/api/v1/jobs/{id}");
        assert_eq!(
            normalize_path("/api/v1/jobs/3f2a9c01b7de/output"),
            "/api/v1/jobs/{id}/output"
        );
    }

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/v1/jobs/123"), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_static() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/api/v1/orchestrator/status"), "/api/v1/orchestrator/status");
    }

    #[test]
    fn test_encode_includes_core_metrics() {
        talkreel_core::metrics::JOBS_SUBMITTED.inc();
        let text = encode_metrics();
        assert!(text.contains("talkreel_jobs_submitted_total"));
    }
}
