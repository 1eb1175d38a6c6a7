//! Metrics collection and exposition.
//!
//! # Metrics
//! - `filtered_image_requests_total` (counter): requests by outcome
//! - `filtered_image_request_duration_seconds` (histogram): time to first byte by outcome
//! - `filtered_image_artifacts_in_flight` (gauge): artifacts awaiting cleanup
//! - `filtered_image_transfers_total` (counter): body transfers by outcome
//! - `filtered_image_cleanup_failures_total` (counter): deletions that failed

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("filtered_image_requests_total", "outcome" => outcome).increment(1);
    histogram!("filtered_image_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn artifact_acquired() {
    gauge!("filtered_image_artifacts_in_flight").increment(1.0);
}

pub fn artifact_released() {
    gauge!("filtered_image_artifacts_in_flight").decrement(1.0);
}

pub fn record_transfer(outcome: &'static str) {
    counter!("filtered_image_transfers_total", "outcome" => outcome).increment(1);
}

pub fn record_cleanup_failure() {
    counter!("filtered_image_cleanup_failures_total").increment(1);
}
