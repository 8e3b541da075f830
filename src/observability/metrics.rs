//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, status, service
//! - `router_request_duration_seconds` (histogram): latency distribution
//! - `router_backend_errors_total` (counter): unreachable backends by service
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for method, service, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("service", service.to_string()),
    ];
    metrics::counter!("router_requests_total", &labels).increment(1);
    metrics::histogram!("router_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a backend that could not be reached.
pub fn record_backend_error(service: &str, reason: &str) {
    metrics::counter!(
        "router_backend_errors_total",
        "service" => service.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}
