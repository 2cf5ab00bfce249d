//! Operational endpoints: health, stats, alerts, cache introspection.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::monitor::HealthStatus;
use crate::service::Governor;

/// `GET /health`. Unhealthy maps to 503 so load balancers drain the node.
pub async fn health(State(gov): State<Arc<Governor>>) -> Response {
    let report = gov.health.check().await;
    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(report)).into_response()
}

/// `GET /stats`. Monitor aggregates over the trailing 24 hours.
pub async fn stats(State(gov): State<Arc<Governor>>) -> Response {
    let stats = gov.monitor.stats();
    let routes: serde_json::Map<String, serde_json::Value> = gov
        .monitor
        .route_rollups(24 * 60 * 60 * 1000)
        .into_iter()
        .map(|(route, rollup)| {
            (
                route,
                json!({
                    "requestCount": rollup.request_count,
                    "errorCount": rollup.error_count,
                    "avgLatencyMs": rollup.avg_latency_ms(),
                    "errorRatePercent": rollup.error_rate_percent(),
                }),
            )
        })
        .collect();
    Json(json!({
        "monitor": stats,
        "routes": routes,
    }))
    .into_response()
}

/// `GET /alerts`. Newest last; resolved alerts stay visible until they
/// rotate out of the ring.
pub async fn alerts(State(gov): State<Arc<Governor>>) -> Response {
    Json(json!({ "alerts": gov.monitor.alerts() })).into_response()
}

/// `POST /alerts/{id}/resolve`.
pub async fn resolve_alert(
    State(gov): State<Arc<Governor>>,
    Path(id): Path<Uuid>,
) -> Response {
    if gov.monitor.resolve_alert(id) {
        Json(json!({ "resolved": id })).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "error": format!("no alert with id {id}"),
                "code": "ALERT_NOT_FOUND",
            })),
        )
            .into_response()
    }
}

/// `GET /cache/stats`. Per-namespace plus the aggregate.
pub async fn cache_stats(State(gov): State<Arc<Governor>>) -> Response {
    let by_namespace: Vec<_> = gov
        .caches
        .stats_by_namespace()
        .into_iter()
        .map(|(name, stats)| json!({ "namespace": name, "stats": stats }))
        .collect();
    Json(json!({
        "aggregate": gov.caches.aggregate_stats(),
        "namespaces": by_namespace,
    }))
    .into_response()
}
