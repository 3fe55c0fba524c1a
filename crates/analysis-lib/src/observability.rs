//! Observability infrastructure for the analysis service
//!
//! Provides:
//! - Prometheus metrics (request latency, request and failure counts, rows returned)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for request latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AnalysisMetricsInner> = OnceLock::new();

struct AnalysisMetricsInner {
    request_latency_seconds: HistogramVec,
    requests: IntCounterVec,
    failures: IntCounterVec,
    rows_returned: IntCounterVec,
}

impl AnalysisMetricsInner {
    fn new() -> Self {
        Self {
            request_latency_seconds: register_histogram_vec!(
                "memory_analysis_request_latency_seconds",
                "Time spent answering an analysis request",
                &["operation"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register request_latency_seconds"),

            requests: register_int_counter_vec!(
                "memory_analysis_requests_total",
                "Total number of analysis requests",
                &["operation"]
            )
            .expect("Failed to register requests_total"),

            failures: register_int_counter_vec!(
                "memory_analysis_failures_total",
                "Total number of analysis requests answered with an error sentinel",
                &["operation", "kind"]
            )
            .expect("Failed to register failures_total"),

            rows_returned: register_int_counter_vec!(
                "memory_analysis_rows_returned_total",
                "Total number of series points or table rows returned",
                &["operation"]
            )
            .expect("Failed to register rows_returned_total"),
        }
    }
}

/// Analysis metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct AnalysisMetrics {
    _private: (),
}

impl Default for AnalysisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AnalysisMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AnalysisMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_latency(&self, operation: &str, duration_secs: f64) {
        self.inner()
            .request_latency_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn inc_requests(&self, operation: &str) {
        self.inner().requests.with_label_values(&[operation]).inc();
    }

    pub fn inc_failures(&self, operation: &str, kind: &str) {
        self.inner()
            .failures
            .with_label_values(&[operation, kind])
            .inc();
    }

    pub fn add_rows(&self, operation: &str, rows: usize) {
        self.inner()
            .rows_returned
            .with_label_values(&[operation])
            .inc_by(rows as u64);
    }

    pub fn requests(&self, operation: &str) -> u64 {
        self.inner().requests.with_label_values(&[operation]).get()
    }

    pub fn failures(&self, operation: &str, kind: &str) -> u64 {
        self.inner()
            .failures
            .with_label_values(&[operation, kind])
            .get()
    }
}

/// Structured logger for analysis events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a request answered with data
    pub fn log_request(&self, operation: &str, job_id: u64, rows: usize, elapsed_secs: f64) {
        info!(
            event = "request_completed",
            instance = %self.instance,
            operation = %operation,
            job_id = job_id,
            rows = rows,
            elapsed_secs = elapsed_secs,
            "Analysis request completed"
        );
    }

    /// Log a request answered with an error sentinel
    pub fn log_failure(&self, operation: &str, job_id: u64, kind: &str, message: &str) {
        warn!(
            event = "request_failed",
            instance = %self.instance,
            operation = %operation,
            job_id = job_id,
            kind = %kind,
            message = %message,
            "Analysis request failed"
        );
    }

    pub fn log_startup(&self, version: &str, tables: usize) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            tables = tables,
            "Memory analysis service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Memory analysis service shutting down"
        );
    }
}
