//! Operational metrics collection and exposition.
//!
//! # Responsibilities
//! - Define governance metrics (requests, rate-limit rejections, cache
//!   hits/misses, alerts)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `governance_requests_total` (counter): requests by method, status
//! - `governance_request_duration_seconds` (histogram): latency distribution
//! - `governance_rate_limited_total` (counter): rejections by key kind
//! - `governance_cache_hits_total` / `governance_cache_misses_total`
//!   (counters): by namespace
//! - `governance_alerts_total` (counter): alerts by level
//!
//! These are cheap operational counters; the PerformanceMonitor keeps its
//! own ring buffers and drives alerting separately.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::monitor::alert::AlertLevel;

/// Install the Prometheus exporter on the given address.
pub fn init_exporter(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "governance_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    histogram!("governance_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a rate-limit rejection.
pub fn record_rate_limited(key_kind: &str) {
    counter!(
        "governance_rate_limited_total",
        "key" => key_kind.to_string(),
    )
    .increment(1);
}

pub fn record_cache_hit(namespace: &str) {
    counter!(
        "governance_cache_hits_total",
        "namespace" => namespace.to_string(),
    )
    .increment(1);
}

pub fn record_cache_miss(namespace: &str) {
    counter!(
        "governance_cache_misses_total",
        "namespace" => namespace.to_string(),
    )
    .increment(1);
}

/// Record a raised alert.
pub fn record_alert(level: AlertLevel) {
    let level = match level {
        AlertLevel::Info => "info",
        AlertLevel::Warning => "warning",
        AlertLevel::Critical => "critical",
    };
    counter!("governance_alerts_total", "level" => level).increment(1);
}
