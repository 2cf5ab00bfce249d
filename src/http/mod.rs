//! HTTP surface of the governance layer.
//!
//! # Responsibilities
//! - Middleware stack: version negotiation, rate limiting, metrics capture
//! - Governance response headers (rate limit, version, deprecation warning)
//! - Operational endpoints (health, stats, alerts, cache introspection)
//!
//! # Data Flow
//! ```text
//! host Router --apply_governance--> metrics -> version -> rate limit -> handlers
//! admin_router: /health /stats /alerts /cache/stats
//! ```

pub mod handlers;
pub mod headers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::error::GovernanceError;
use crate::service::Governor;

pub use middleware::ClientId;

/// Wrap a router in the full governance stack. Layers added later run
/// earlier, so the metrics layer sees every request, including ones the
/// version check or the rate limiter rejects.
pub fn apply_governance(router: Router, gov: &Arc<Governor>) -> Router {
    router
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(from_fn_with_state(
            gov.clone(),
            middleware::rate_limit_middleware,
        ))
        .layer(from_fn_with_state(
            gov.clone(),
            middleware::version_middleware,
        ))
        .layer(from_fn_with_state(
            gov.clone(),
            middleware::metrics_middleware,
        ))
}

/// Operational endpoints, served outside the governed stack so health
/// probes are never rate limited.
pub fn admin_router(gov: Arc<Governor>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        .route("/alerts", get(handlers::alerts))
        .route("/alerts/{id}/resolve", post(handlers::resolve_alert))
        .route("/cache/stats", get(handlers::cache_stats))
        .with_state(gov)
}

async fn not_found(req: axum::extract::Request) -> axum::response::Response {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({
            "success": false,
            "error": format!("no route for {} {}", req.method(), req.uri().path()),
            "code": "NOT_FOUND",
            "timestamp": crate::clock::now_ms(),
        })),
    )
        .into_response()
}

/// Known path, wrong method. Axum's default answer is a bare 405; routing
/// it through the error type keeps the envelope and the audit log.
async fn method_not_allowed() -> axum::response::Response {
    GovernanceError::MethodNotAllowed.into_response()
}
