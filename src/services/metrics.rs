//! Prometheus metrics for caption-service.

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Workflow metrics
pub static CAPTION_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static POLL_WAITS_PER_REQUEST: OnceLock<Histogram> = OnceLock::new();

/// Initialize all metrics. Must be called once at startup.
pub fn init_metrics() {
    let registry = Registry::new();

    let caption_requests = IntCounterVec::new(
        Opts::new("caption_requests_total", "Total caption requests"),
        &["model", "outcome"],
    )
    .expect("Failed to create caption_requests_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "caption_provider_latency_seconds",
            "Remote provider API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["operation"],
    )
    .expect("Failed to create caption_provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new("caption_provider_errors_total", "Total provider errors"),
        &["operation", "error_type"],
    )
    .expect("Failed to create caption_provider_errors_total metric");

    let poll_waits = Histogram::with_opts(
        HistogramOpts::new(
            "caption_poll_waits_per_request",
            "Interval waits spent per request before the remote file was ready",
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 60.0]),
    )
    .expect("Failed to create caption_poll_waits_per_request metric");

    registry
        .register(Box::new(caption_requests.clone()))
        .expect("Failed to register caption_requests_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register caption_provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register caption_provider_errors_total");
    registry
        .register(Box::new(poll_waits.clone()))
        .expect("Failed to register caption_poll_waits_per_request");

    let _ = REGISTRY.set(registry);
    let _ = CAPTION_REQUESTS_TOTAL.set(caption_requests);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = POLL_WAITS_PER_REQUEST.set(poll_waits);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed caption request.
pub fn record_caption_request(model: &str, outcome: &str) {
    if let Some(counter) = CAPTION_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[model, outcome]).inc();
    }
}

/// Record provider call latency.
pub fn record_provider_latency(operation: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(operation: &str, error_type: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[operation, error_type]).inc();
    }
}

/// Record the number of interval waits a request spent polling.
pub fn record_poll_waits(waits: u32) {
    if let Some(histogram) = POLL_WAITS_PER_REQUEST.get() {
        histogram.observe(waits as f64);
    }
}
