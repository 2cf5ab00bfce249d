//! Governance middleware stack.
//!
//! # Data Flow
//! ```text
//! Request -> metrics_middleware (outermost, timing starts)
//!         -> version_middleware (resolve + check, envelope transform on the way out)
//!         -> rate_limit_middleware (admit or 429)
//!         -> handler
//! ```
//!
//! # Design Decisions
//! - The metrics layer sits outermost so rejections (429, 400, 410) are
//!   recorded with the same path as successful requests
//! - The resolved version rides request extensions inward and response
//!   extensions outward; handlers can read it, the metrics layer tags with it
//! - Response transformation buffers the body; oversized or non-JSON bodies
//!   pass through untouched

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::clock;
use crate::error::GovernanceError;
use crate::http::headers;
use crate::monitor::{ErrorMetric, PerformanceMetric};
use crate::observability::metrics as op_metrics;
use crate::rate_limit::key;
use crate::service::Governor;
use crate::version::{transform, ApiVersion};

/// Authenticated caller identity, inserted by the host's auth layer before
/// the governance stack. Absent for anonymous traffic.
#[derive(Debug, Clone)]
pub struct ClientId(pub String);

/// Largest response body the envelope transform will buffer.
const TRANSFORM_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Resolve the requested API version, reject unsupported and sunset
/// versions, and reshape JSON response bodies to the version's envelope.
pub async fn version_middleware(
    State(gov): State<Arc<Governor>>,
    mut req: Request,
    next: Next,
) -> Response {
    let version = gov.negotiator.extract(req.uri(), req.headers());
    let info = gov.negotiator.info(&version);

    let mut response = match gov.negotiator.check(&version) {
        Ok(()) => {
            req.extensions_mut().insert(version.clone());
            let response = next.run(req).await;
            transform_response(response, &version).await
        }
        // Rejections take the same outbound path so the envelope matches
        // what the requested version expects.
        Err(err) => transform_response(err.into_response(), &version).await,
    };

    headers::apply_version(
        response.headers_mut(),
        &version,
        &gov.negotiator.supported_versions(),
        gov.negotiator.latest(),
    );
    if info.is_supported && info.is_deprecated {
        headers::deprecation_warning(response.headers_mut(), &info);
        tracing::warn!(
            target: "security",
            version = %version,
            "deprecated API version requested"
        );
    }

    response.extensions_mut().insert(version);
    response
}

/// Reshape a JSON response body for the resolved version.
async fn transform_response(response: Response, version: &ApiVersion) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);
    let declared_len = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if !is_json || declared_len.is_some_and(|len| len > TRANSFORM_BODY_LIMIT) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, TRANSFORM_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to buffer response for transform");
            parts.headers.remove(CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(payload) => {
            let transformed = transform::transform(payload, version);
            serde_json::to_vec(&transformed).unwrap_or_else(|_| bytes.to_vec())
        }
        // Not actually JSON despite the content type.
        Err(_) => bytes.to_vec(),
    };
    if let Ok(len) = axum::http::HeaderValue::from_str(&body.len().to_string()) {
        parts.headers.insert(CONTENT_LENGTH, len);
    }
    Response::from_parts(parts, Body::from(body))
}

/// Admit or reject the request against the per-route rate limit.
pub async fn rate_limit_middleware(
    State(gov): State<Arc<Governor>>,
    req: Request,
    next: Next,
) -> Response {
    let (rate_key, key_kind) = derive_key(&req);
    let cfg = gov.config.rate_limit.config_for(req.uri().path());
    let decision = gov.limiter.check(&rate_key, &cfg);

    if !decision.allowed {
        op_metrics::record_rate_limited(key_kind);
        let err = GovernanceError::RateLimitExceeded {
            limit: cfg.max_requests,
            reset_unix_secs: clock::ms_to_secs_ceil(decision.reset_unix_ms),
        };
        let mut response = err.into_response();
        headers::apply_rate_limit(response.headers_mut(), cfg.max_requests, &decision);
        return response;
    }

    let mut response = next.run(req).await;
    headers::apply_rate_limit(response.headers_mut(), cfg.max_requests, &decision);
    response
}

fn derive_key(req: &Request) -> (String, &'static str) {
    if let Some(client) = req.extensions().get::<ClientId>() {
        (key::user(&client.0), "user")
    } else if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        (key::client(addr.ip()), "ip")
    } else {
        // No connect info (e.g. in-process testing); one shared bucket.
        ("ip:unknown".to_string(), "ip")
    }
}

/// Time the request and feed the monitor; failed statuses also produce an
/// error record.
pub async fn metrics_middleware(
    State(gov): State<Arc<Governor>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let route = req.uri().path().to_string();
    let method = req.method().to_string();
    let client_id = req.extensions().get::<ClientId>().map(|c| c.0.clone());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let protocol_version = response
        .extensions()
        .get::<ApiVersion>()
        .map(|v| v.to_string());
    let response_size_bytes = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    let now_ms = clock::now_ms();

    op_metrics::record_request(&method, status, start);
    gov.monitor.record_metric(PerformanceMetric {
        timestamp_ms: now_ms,
        route: route.clone(),
        method: method.clone(),
        duration_ms: start.elapsed().as_millis() as u64,
        status_code: status,
        memory: gov.monitor.memory_snapshot(),
        response_size_bytes,
        client_id: client_id.clone(),
        protocol_version: protocol_version.clone(),
    });
    if status >= 400 {
        gov.monitor.record_error(ErrorMetric {
            timestamp_ms: now_ms,
            route,
            method,
            error_code: format!("HTTP_{status}"),
            message: response
                .status()
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            status_code: status,
            client_id,
            protocol_version,
        });
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_transform_wraps_bare_json() {
        let response = (
            [(CONTENT_TYPE, "application/json")],
            "{\"id\":1}".to_string(),
        )
            .into_response();
        let v2 = ApiVersion::parse("v2").unwrap();

        let transformed = transform_response(response, &v2).await;
        let bytes = to_bytes(transformed.into_body(), usize::MAX).await.unwrap();
        let payload: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(payload["success"], true);
        assert_eq!(payload["data"]["id"], 1);
        assert!(payload["timestamp"].is_u64());
    }

    #[tokio::test]
    async fn test_transform_skips_non_json() {
        let response = (
            [(CONTENT_TYPE, "text/plain")],
            "hello".to_string(),
        )
            .into_response();
        let v1 = ApiVersion::parse("v1").unwrap();

        let transformed = transform_response(response, &v1).await;
        assert_eq!(transformed.status(), StatusCode::OK);
        let bytes = to_bytes(transformed.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[test]
    fn test_derive_key_prefers_identity() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("1.2.3.4:5000".parse().unwrap()));

        let (k, kind) = derive_key(&req);
        assert_eq!(k, "ip:1.2.3.4");
        assert_eq!(kind, "ip");

        req.extensions_mut().insert(ClientId("alice".to_string()));
        let (k, kind) = derive_key(&req);
        assert_eq!(k, "user:alice");
        assert_eq!(kind, "user");
    }
}
