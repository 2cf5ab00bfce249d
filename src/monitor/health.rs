//! Aggregate health checking.
//!
//! # Data Flow
//! ```text
//! /health request
//!     -> external store probe (up/down + latency)
//!     -> cache stats (hit rate, footprint)
//!     -> process memory ratio
//!     -> per-route rollups (avg latency, error rate)
//!     -> compose: unhealthy if any sub-check down,
//!                 degraded on recent unresolved alerts,
//!                 healthy otherwise
//! ```
//!
//! # Design Decisions
//! - The store probe owns its own timeout; this layer treats a probe error
//!   as "down" and never cancels it
//! - Route rollups use the monitor's error window so /health and alerting
//!   agree on what "recent" means

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::cache::CacheManager;
use crate::clock;
use crate::monitor::monitor::PerformanceMonitor;

/// Async probe of the external store (database).
///
/// Implementations must bound their own execution time; a hung probe hangs
/// the health check.
pub trait StoreProbe: Send + Sync {
    fn ping(&self) -> BoxFuture<'_, Result<(), String>>;
}

/// Probe that always succeeds. Suitable for demos and tests.
pub struct AlwaysUpProbe;

impl StoreProbe for AlwaysUpProbe {
    fn ping(&self) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

/// Overall state reported by the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Up/down flag used by the sub-checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCheck {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheCheck {
    pub status: CheckStatus,
    pub hit_rate: f64,
    pub memory_usage: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCheck {
    pub status: CheckStatus,
    pub usage: u64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCheck {
    pub status: CheckStatus,
    pub avg_response_time: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub database: StoreCheck,
    pub cache: CacheCheck,
    pub memory: MemoryCheck,
    pub apis: BTreeMap<String, RouteCheck>,
}

/// The full health report, shaped for the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: u64,
    pub checks: HealthChecks,
    pub version: String,
    pub uptime: u64,
}

/// Composes sub-checks into one report.
pub struct HealthChecker {
    monitor: Arc<PerformanceMonitor>,
    caches: Arc<CacheManager>,
    store: Arc<dyn StoreProbe>,
}

impl HealthChecker {
    pub fn new(
        monitor: Arc<PerformanceMonitor>,
        caches: Arc<CacheManager>,
        store: Arc<dyn StoreProbe>,
    ) -> Self {
        Self {
            monitor,
            caches,
            store,
        }
    }

    pub async fn check(&self) -> HealthReport {
        let settings = self.monitor.settings().clone();
        let now_ms = clock::now_ms();

        let started = Instant::now();
        let database = match self.store.ping().await {
            Ok(()) => StoreCheck {
                status: CheckStatus::Up,
                response_time_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Err(message) => {
                tracing::warn!(error = %message, "external store probe failed");
                StoreCheck {
                    status: CheckStatus::Down,
                    response_time_ms: None,
                    error: Some(message),
                }
            }
        };

        let cache_stats = self.caches.aggregate_stats();
        let cache = CacheCheck {
            status: CheckStatus::Up,
            hit_rate: cache_stats.hit_rate(),
            memory_usage: cache_stats.estimated_bytes,
        };

        let snapshot = self.monitor.memory_snapshot();
        let usage_percent = snapshot.usage_percent();
        let memory = MemoryCheck {
            status: if usage_percent > settings.memory_percent {
                CheckStatus::Down
            } else {
                CheckStatus::Up
            },
            usage: snapshot.heap_used_bytes,
            usage_percent,
        };

        let window_ms = settings.error_window_secs * 1000;
        let apis: BTreeMap<String, RouteCheck> = self
            .monitor
            .route_rollups(window_ms)
            .into_iter()
            .map(|(route, rollup)| {
                let avg = rollup.avg_latency_ms();
                let error_rate = rollup.error_rate_percent();
                let status = if error_rate > settings.error_rate_percent
                    || avg > settings.slow_request_ms as f64
                {
                    CheckStatus::Down
                } else {
                    CheckStatus::Up
                };
                (
                    route,
                    RouteCheck {
                        status,
                        avg_response_time: avg,
                        error_rate,
                    },
                )
            })
            .collect();

        let any_down = database.status == CheckStatus::Down
            || memory.status == CheckStatus::Down
            || apis.values().any(|r| r.status == CheckStatus::Down);

        let status = if any_down {
            HealthStatus::Unhealthy
        } else if self
            .monitor
            .has_recent_unresolved_alert(settings.degraded_window_secs * 1000)
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport {
            status,
            timestamp: now_ms,
            checks: HealthChecks {
                database,
                cache,
                memory,
                apis,
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: now_ms.saturating_sub(self.monitor.started_at_ms()) / 1000,
        }
    }
}
