//! Error taxonomy for the governance layer.
//!
//! # Responsibilities
//! - Define the typed conditions raised by the subsystems
//! - Map each condition to a machine-readable code and HTTP status
//! - Convert conditions into the wire error envelope at a single boundary
//! - Tag security-sensitive codes for separate audit logging
//!
//! # Design Decisions
//! - Alerts are not errors: an alert is a derived observation about aggregate
//!   behavior and never aborts a request. Only per-request conditions live here.
//! - `ExternalStoreUnavailable` surfaces through the health check, not through
//!   per-request failures; it exists here for the 503 the health endpoint maps to.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::clock;

/// Typed conditions raised by the governance subsystems.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Too many requests for the derived key; retryable after `reset_unix_secs`.
    #[error("rate limit exceeded, retry after {reset_unix_secs}")]
    RateLimitExceeded {
        limit: u32,
        reset_unix_secs: u64,
    },

    /// Requested API version is not in the supported set.
    #[error("API version {version} is not supported")]
    VersionNotSupported {
        version: String,
        supported: Vec<String>,
    },

    /// Requested API version passed its sunset date; clients must migrate.
    #[error("API version {version} has been retired")]
    VersionSunset {
        version: String,
        sunset_unix_secs: u64,
        migration_guide: Option<String>,
    },

    /// Client input defect.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Route exists but the method does not.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// External store probe failed; surfaced via the health check.
    #[error("external store unavailable: {message}")]
    StoreUnavailable { message: String },
}

impl GovernanceError {
    /// Machine-readable code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::VersionNotSupported { .. } => "VERSION_NOT_SUPPORTED",
            Self::VersionSunset { .. } => "VERSION_SUNSET",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
        }
    }

    /// HTTP status the boundary maps this condition to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::VersionNotSupported { .. } => StatusCode::BAD_REQUEST,
            Self::VersionSunset { .. } => StatusCode::GONE,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether the code is routed to the security audit log.
    pub fn is_security_sensitive(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::VersionSunset { .. }
        )
    }

    /// Optional machine-readable detail payload for the envelope.
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::RateLimitExceeded {
                limit,
                reset_unix_secs,
            } => json!({ "limit": limit, "resetAt": reset_unix_secs }),
            Self::VersionNotSupported { supported, .. } => {
                json!({ "supportedVersions": supported })
            }
            Self::VersionSunset {
                sunset_unix_secs,
                migration_guide,
                ..
            } => json!({
                "sunsetAt": sunset_unix_secs,
                "migrationGuide": migration_guide,
            }),
            _ => serde_json::Value::Null,
        }
    }
}

impl IntoResponse for GovernanceError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.is_security_sensitive() {
            tracing::warn!(
                target: "security",
                code = self.code(),
                status = status.as_u16(),
                "request rejected: {self}"
            );
        } else {
            tracing::warn!(
                code = self.code(),
                status = status.as_u16(),
                "request rejected: {self}"
            );
        }

        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
            "timestamp": clock::now_ms(),
        });
        let details = self.details();
        if !details.is_null() {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = GovernanceError::RateLimitExceeded {
            limit: 10,
            reset_unix_secs: 0,
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code(), "RATE_LIMIT_EXCEEDED");
        assert!(err.is_security_sensitive());

        let err = GovernanceError::VersionSunset {
            version: "v1".into(),
            sunset_unix_secs: 0,
            migration_guide: None,
        };
        assert_eq!(err.status(), StatusCode::GONE);

        let err = GovernanceError::VersionNotSupported {
            version: "v9".into(),
            supported: vec!["v1".into(), "v2".into()],
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(!err.is_security_sensitive());

        let err = GovernanceError::Validation {
            message: "missing field".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");

        assert_eq!(
            GovernanceError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_details_payload() {
        let err = GovernanceError::VersionNotSupported {
            version: "v9".into(),
            supported: vec!["v2".into()],
        };
        assert_eq!(err.details()["supportedVersions"][0], "v2");

        assert!(GovernanceError::MethodNotAllowed.details().is_null());
    }
}
