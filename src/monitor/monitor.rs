//! Performance monitor: ingestion, threshold analysis, rolling stats.
//!
//! # Responsibilities
//! - Ingest per-request metrics and errors into bounded ring buffers
//! - Run threshold analysis synchronously on each ingestion
//! - Answer trailing-window stats queries by filtering the buffers
//!
//! # Design Decisions
//! - No separate accumulator state: stats recompute over the rings on every
//!   query, trading recompute cost for correctness-by-construction
//! - Analysis uses the ingested record's own timestamp, so behavior is
//!   deterministic under test
//! - Alerts sharing a title are suppressed while an unresolved one exists
//!   inside the cooldown, keeping a flapping threshold from flooding the ring

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::clock;
use crate::config::MonitorSettings;
use crate::monitor::alert::{Alert, AlertLevel};
use crate::monitor::metric::{ErrorMetric, MemorySnapshot, PerformanceMetric};
use crate::monitor::ring::Ring;
use crate::observability::metrics as op_metrics;

/// Source of process heap readings.
///
/// The monitor itself never samples on a timer; callers attach a snapshot to
/// each metric they record.
pub trait MemoryProbe: Send + Sync {
    fn snapshot(&self) -> MemorySnapshot;
}

/// Reads VmRSS / VmSize from `/proc/self/status`; reports zeros where the
/// file is unavailable (non-Linux hosts).
pub struct ProcMemoryProbe;

impl MemoryProbe for ProcMemoryProbe {
    fn snapshot(&self) -> MemorySnapshot {
        let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
            return MemorySnapshot::default();
        };
        let field_kb = |name: &str| -> u64 {
            status
                .lines()
                .find(|l| l.starts_with(name))
                .and_then(|l| l.split_whitespace().nth(1))
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        };
        MemorySnapshot {
            heap_used_bytes: field_kb("VmRSS:") * 1024,
            heap_total_bytes: field_kb("VmSize:") * 1024,
        }
    }
}

/// Fixed readings, for tests and hosts that sample elsewhere.
pub struct FixedMemoryProbe(pub MemorySnapshot);

impl MemoryProbe for FixedMemoryProbe {
    fn snapshot(&self) -> MemorySnapshot {
        self.0
    }
}

/// Trailing-24h aggregate answered by [`PerformanceMonitor::stats`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStats {
    pub request_count: usize,
    pub error_count: usize,
    pub avg_latency_ms: f64,
    pub error_rate_percent: f64,
    pub open_alerts: usize,
    pub uptime_secs: u64,
    pub metrics_dropped: u64,
    pub errors_dropped: u64,
}

/// Per-route rollup over a trailing window, for health aggregation.
#[derive(Debug, Clone, Default)]
pub struct RouteRollup {
    pub request_count: usize,
    pub error_count: usize,
    pub total_duration_ms: u64,
}

impl RouteRollup {
    pub fn avg_latency_ms(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.request_count as f64
        }
    }

    pub fn error_rate_percent(&self) -> f64 {
        let total = self.request_count + self.error_count;
        if total == 0 {
            0.0
        } else {
            self.error_count as f64 / total as f64 * 100.0
        }
    }
}

struct MonitorState {
    metrics: Ring<PerformanceMetric>,
    errors: Ring<ErrorMetric>,
    alerts: Ring<Alert>,
    last_alert_ms: HashMap<String, u64>,
}

/// Ingests request outcomes, raises alerts, answers stats queries.
pub struct PerformanceMonitor {
    settings: MonitorSettings,
    probe: Box<dyn MemoryProbe>,
    state: Mutex<MonitorState>,
    started_at_ms: u64,
}

impl PerformanceMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self::with_probe(settings, Box::new(ProcMemoryProbe))
    }

    pub fn with_probe(settings: MonitorSettings, probe: Box<dyn MemoryProbe>) -> Self {
        let state = MonitorState {
            metrics: Ring::new(settings.metric_buffer),
            errors: Ring::new(settings.error_buffer),
            alerts: Ring::new(settings.alert_buffer),
            last_alert_ms: HashMap::new(),
        };
        Self {
            settings,
            probe,
            state: Mutex::new(state),
            started_at_ms: clock::now_ms(),
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Current heap reading from the attached probe.
    pub fn memory_snapshot(&self) -> MemorySnapshot {
        self.probe.snapshot()
    }

    /// Ingest one completed request and run threshold analysis.
    pub fn record_metric(&self, metric: PerformanceMetric) {
        let now_ms = metric.timestamp_ms;
        let mut state = self.state.lock().expect("monitor mutex poisoned");

        if metric.duration_ms > self.settings.slow_request_ms {
            self.raise(
                &mut state,
                AlertLevel::Warning,
                "Slow request",
                format!(
                    "{} {} took {}ms (threshold {}ms)",
                    metric.method, metric.route, metric.duration_ms, self.settings.slow_request_ms
                ),
                json!({
                    "route": metric.route,
                    "method": metric.method,
                    "durationMs": metric.duration_ms,
                }),
                now_ms,
            );
        }

        let usage = metric.memory.usage_percent();
        if usage > self.settings.memory_percent {
            self.raise(
                &mut state,
                AlertLevel::Critical,
                "High memory usage",
                format!(
                    "heap usage at {usage:.1}% (threshold {:.1}%)",
                    self.settings.memory_percent
                ),
                json!({
                    "heapUsedBytes": metric.memory.heap_used_bytes,
                    "heapTotalBytes": metric.memory.heap_total_bytes,
                    "usagePercent": usage,
                }),
                now_ms,
            );
        }

        state.metrics.push(metric);
        self.analyze_error_rate(&mut state, now_ms);
    }

    /// Ingest one failed request and run threshold analysis.
    pub fn record_error(&self, error: ErrorMetric) {
        let now_ms = error.timestamp_ms;
        let mut state = self.state.lock().expect("monitor mutex poisoned");
        state.errors.push(error);
        self.analyze_error_rate(&mut state, now_ms);
    }

    fn analyze_error_rate(&self, state: &mut MonitorState, now_ms: u64) {
        let floor = now_ms.saturating_sub(self.settings.error_window_secs * 1000);
        let recent_metrics = state
            .metrics
            .iter()
            .filter(|m| m.timestamp_ms >= floor)
            .count();
        let recent_errors = state
            .errors
            .iter()
            .filter(|e| e.timestamp_ms >= floor)
            .count();

        let total = recent_metrics + recent_errors;
        if total == 0 {
            return;
        }
        let rate = recent_errors as f64 / total as f64 * 100.0;
        if rate > self.settings.error_rate_percent {
            self.raise(
                state,
                AlertLevel::Critical,
                "High error rate",
                format!(
                    "error rate at {rate:.1}% over the last {}s (threshold {:.1}%)",
                    self.settings.error_window_secs, self.settings.error_rate_percent
                ),
                json!({
                    "recentErrors": recent_errors,
                    "recentRequests": recent_metrics,
                    "errorRatePercent": rate,
                }),
                now_ms,
            );
        }
    }

    fn raise(
        &self,
        state: &mut MonitorState,
        level: AlertLevel,
        title: &str,
        message: String,
        metadata: serde_json::Value,
        now_ms: u64,
    ) {
        let cooldown_ms = self.settings.alert_cooldown_secs * 1000;
        if let Some(&last) = state.last_alert_ms.get(title) {
            let unresolved_exists = state
                .alerts
                .iter()
                .any(|a| a.title == title && !a.resolved);
            if unresolved_exists && now_ms < last.saturating_add(cooldown_ms) {
                return;
            }
        }

        let alert = Alert::new(level, title, message, now_ms, metadata);
        match level {
            AlertLevel::Critical => {
                tracing::error!(alert_id = %alert.id, title, "{}", alert.message)
            }
            _ => tracing::warn!(alert_id = %alert.id, title, "{}", alert.message),
        }
        op_metrics::record_alert(level);
        state.last_alert_ms.insert(title.to_string(), now_ms);
        state.alerts.push(alert);
    }

    /// All retained alerts, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        let state = self.state.lock().expect("monitor mutex poisoned");
        state.alerts.iter().cloned().collect()
    }

    /// Unresolved alerts only.
    pub fn open_alerts(&self) -> Vec<Alert> {
        let state = self.state.lock().expect("monitor mutex poisoned");
        state
            .alerts
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    /// Mark an alert resolved. Returns false for unknown ids.
    pub fn resolve_alert(&self, id: Uuid) -> bool {
        let mut state = self.state.lock().expect("monitor mutex poisoned");
        for alert in state.alerts.iter_mut() {
            if alert.id == id {
                alert.resolved = true;
                return true;
            }
        }
        false
    }

    /// Whether an unresolved warning-or-worse alert fired within the window.
    pub fn has_recent_unresolved_alert(&self, window_ms: u64) -> bool {
        self.has_recent_unresolved_alert_at(window_ms, clock::now_ms())
    }

    pub(crate) fn has_recent_unresolved_alert_at(&self, window_ms: u64, now_ms: u64) -> bool {
        let floor = now_ms.saturating_sub(window_ms);
        let state = self.state.lock().expect("monitor mutex poisoned");
        let recent = state.alerts.iter().any(|a| {
            !a.resolved && a.level >= AlertLevel::Warning && a.timestamp_ms >= floor
        });
        recent
    }

    /// Trailing-24h aggregates, computed by filtering the rings.
    pub fn stats(&self) -> MonitorStats {
        self.stats_at(clock::now_ms())
    }

    pub(crate) fn stats_at(&self, now_ms: u64) -> MonitorStats {
        const DAY_MS: u64 = 24 * 60 * 60 * 1000;
        let floor = now_ms.saturating_sub(DAY_MS);
        let state = self.state.lock().expect("monitor mutex poisoned");

        let recent: Vec<&PerformanceMetric> = state
            .metrics
            .iter()
            .filter(|m| m.timestamp_ms >= floor)
            .collect();
        let error_count = state
            .errors
            .iter()
            .filter(|e| e.timestamp_ms >= floor)
            .count();

        let request_count = recent.len();
        let avg_latency_ms = if request_count == 0 {
            0.0
        } else {
            recent.iter().map(|m| m.duration_ms).sum::<u64>() as f64 / request_count as f64
        };
        let total = request_count + error_count;
        let error_rate_percent = if total == 0 {
            0.0
        } else {
            error_count as f64 / total as f64 * 100.0
        };

        MonitorStats {
            request_count,
            error_count,
            avg_latency_ms,
            error_rate_percent,
            open_alerts: state.alerts.iter().filter(|a| !a.resolved).count(),
            uptime_secs: now_ms.saturating_sub(self.started_at_ms) / 1000,
            metrics_dropped: state.metrics.dropped(),
            errors_dropped: state.errors.dropped(),
        }
    }

    /// Per-route rollups over a trailing window.
    pub fn route_rollups(&self, window_ms: u64) -> HashMap<String, RouteRollup> {
        self.route_rollups_at(window_ms, clock::now_ms())
    }

    pub(crate) fn route_rollups_at(
        &self,
        window_ms: u64,
        now_ms: u64,
    ) -> HashMap<String, RouteRollup> {
        let floor = now_ms.saturating_sub(window_ms);
        let state = self.state.lock().expect("monitor mutex poisoned");
        let mut rollups: HashMap<String, RouteRollup> = HashMap::new();

        for m in state.metrics.iter().filter(|m| m.timestamp_ms >= floor) {
            let rollup = rollups.entry(m.route.clone()).or_default();
            rollup.request_count += 1;
            rollup.total_duration_ms += m.duration_ms;
        }
        for e in state.errors.iter().filter(|e| e.timestamp_ms >= floor) {
            rollups.entry(e.route.clone()).or_default().error_count += 1;
        }
        rollups
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(route: &str, duration_ms: u64, at_ms: u64) -> PerformanceMetric {
        PerformanceMetric {
            timestamp_ms: at_ms,
            route: route.to_string(),
            method: "GET".to_string(),
            duration_ms,
            status_code: 200,
            memory: MemorySnapshot {
                heap_used_bytes: 10,
                heap_total_bytes: 100,
            },
            response_size_bytes: None,
            client_id: None,
            protocol_version: None,
        }
    }

    fn error(route: &str, at_ms: u64) -> ErrorMetric {
        ErrorMetric {
            timestamp_ms: at_ms,
            route: route.to_string(),
            method: "GET".to_string(),
            error_code: "HTTP_500".to_string(),
            message: "boom".to_string(),
            status_code: 500,
            client_id: None,
            protocol_version: None,
        }
    }

    fn monitor() -> PerformanceMonitor {
        PerformanceMonitor::new(MonitorSettings::default())
    }

    #[test]
    fn test_slow_request_raises_warning() {
        let monitor = monitor();
        monitor.record_metric(metric("/api/slow", 3000, 1000));

        let alerts = monitor.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert_eq!(alerts[0].title, "Slow request");
    }

    #[test]
    fn test_fast_request_raises_nothing() {
        let monitor = monitor();
        monitor.record_metric(metric("/api/fast", 10, 1000));
        assert!(monitor.alerts().is_empty());
    }

    #[test]
    fn test_memory_pressure_raises_critical() {
        let monitor = monitor();
        let mut m = metric("/api/x", 10, 1000);
        m.memory = MemorySnapshot {
            heap_used_bytes: 90,
            heap_total_bytes: 100,
        };
        monitor.record_metric(m);

        let alerts = monitor.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Critical);
        assert_eq!(alerts[0].title, "High memory usage");
    }

    #[test]
    fn test_error_rate_over_trailing_window() {
        let monitor = monitor();
        // 19 successes + 1 error = 5% exactly; not over threshold.
        for i in 0..19 {
            monitor.record_metric(metric("/api/x", 10, 1000 + i));
        }
        monitor.record_error(error("/api/x", 2000));
        assert!(monitor.alerts().is_empty());

        // A second error pushes the rate over 5%.
        monitor.record_error(error("/api/x", 2001));
        let alerts = monitor.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "High error rate");
        assert_eq!(alerts[0].level, AlertLevel::Critical);
    }

    #[test]
    fn test_errors_outside_window_ignored() {
        let monitor = monitor();
        monitor.record_error(error("/api/x", 0));
        monitor.alerts().iter().for_each(|a| {
            monitor.resolve_alert(a.id);
        });

        // 10 minutes later the old error is outside the 5 minute window.
        monitor.record_metric(metric("/api/x", 10, 600_000));
        let open = monitor.open_alerts();
        assert!(open.is_empty(), "stale error should not re-alert: {open:?}");
    }

    #[test]
    fn test_duplicate_alert_suppressed_within_cooldown() {
        let monitor = monitor();
        monitor.record_metric(metric("/api/slow", 3000, 1000));
        monitor.record_metric(metric("/api/slow", 3000, 2000));
        assert_eq!(monitor.alerts().len(), 1);

        // Past the cooldown a fresh alert fires.
        monitor.record_metric(metric("/api/slow", 3000, 70_000));
        assert_eq!(monitor.alerts().len(), 2);
    }

    #[test]
    fn test_resolution_reopens_alerting() {
        let monitor = monitor();
        monitor.record_metric(metric("/api/slow", 3000, 1000));
        let id = monitor.alerts()[0].id;
        assert!(monitor.resolve_alert(id));
        assert!(!monitor.resolve_alert(Uuid::new_v4()));

        monitor.record_metric(metric("/api/slow", 3000, 2000));
        assert_eq!(monitor.alerts().len(), 2);
        assert_eq!(monitor.open_alerts().len(), 1);
    }

    #[test]
    fn test_stats_aggregate_trailing_day() {
        let monitor = monitor();
        let now = 100_000_000;
        monitor.record_metric(metric("/a", 100, now - 1000));
        monitor.record_metric(metric("/a", 300, now - 500));
        monitor.record_error(error("/a", now - 100));

        let stats = monitor.stats_at(now);
        assert_eq!(stats.request_count, 2);
        assert_eq!(stats.error_count, 1);
        assert!((stats.avg_latency_ms - 200.0).abs() < 1e-9);
        assert!((stats.error_rate_percent - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_route_rollups_group_by_route() {
        let monitor = monitor();
        monitor.record_metric(metric("/a", 100, 1000));
        monitor.record_metric(metric("/a", 200, 1100));
        monitor.record_metric(metric("/b", 50, 1200));
        monitor.record_error(error("/b", 1300));

        let rollups = monitor.route_rollups_at(10_000, 2000);
        assert!((rollups["/a"].avg_latency_ms() - 150.0).abs() < 1e-9);
        assert_eq!(rollups["/a"].error_count, 0);
        assert!((rollups["/b"].error_rate_percent() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_ring_retention_drops_oldest_metric() {
        let settings = MonitorSettings {
            metric_buffer: 5,
            ..Default::default()
        };
        let monitor = PerformanceMonitor::new(settings);
        for i in 0..10 {
            monitor.record_metric(metric("/a", 10, i));
        }
        let stats = monitor.stats_at(100);
        assert_eq!(stats.request_count, 5);
        assert_eq!(stats.metrics_dropped, 5);
    }
}
