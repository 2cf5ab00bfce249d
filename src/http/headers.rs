//! Response header helpers for the governance layer.

use axum::http::{header::HeaderName, HeaderMap, HeaderValue};

use crate::clock;
use crate::rate_limit::RateLimitDecision;
use crate::version::{ApiVersion, VersionInfo};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

pub const API_VERSION: HeaderName = HeaderName::from_static("api-version");
pub const API_SUPPORTED_VERSIONS: HeaderName = HeaderName::from_static("api-supported-versions");
pub const API_LATEST_VERSION: HeaderName = HeaderName::from_static("api-latest-version");

fn value_from_string(s: String) -> HeaderValue {
    HeaderValue::from_str(&s).unwrap_or(HeaderValue::from_static(""))
}

/// Set `X-RateLimit-Limit` / `-Remaining` / `-Reset` (unix seconds).
pub fn apply_rate_limit(headers: &mut HeaderMap, limit: u32, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, value_from_string(limit.to_string()));
    headers.insert(
        X_RATELIMIT_REMAINING,
        value_from_string(decision.remaining.to_string()),
    );
    headers.insert(
        X_RATELIMIT_RESET,
        value_from_string(clock::ms_to_secs_ceil(decision.reset_unix_ms).to_string()),
    );
}

/// Set `API-Version`, `API-Supported-Versions` (comma-joined) and
/// `API-Latest-Version`.
pub fn apply_version(
    headers: &mut HeaderMap,
    version: &ApiVersion,
    supported: &[String],
    latest: &str,
) {
    headers.insert(API_VERSION, value_from_string(version.to_string()));
    headers.insert(
        API_SUPPORTED_VERSIONS,
        value_from_string(supported.join(", ")),
    );
    headers.insert(API_LATEST_VERSION, value_from_string(latest.to_string()));
}

/// `Warning: 299 - "..."` for deprecated versions.
pub fn deprecation_warning(headers: &mut HeaderMap, info: &VersionInfo) {
    let mut message = format!(
        "API version {} is deprecated and will be removed", info.version
    );
    if let Some(guide) = &info.migration_guide {
        message.push_str(&format!("; see {guide}"));
    }
    headers.insert(
        axum::http::header::WARNING,
        value_from_string(format!("299 - \"{message}\"")),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_headers() {
        let mut headers = HeaderMap::new();
        let decision = RateLimitDecision {
            allowed: true,
            remaining: 7,
            reset_unix_ms: 1_700_000_500,
            total_hits: 3,
        };
        apply_rate_limit(&mut headers, 10, &decision);

        assert_eq!(headers[&X_RATELIMIT_LIMIT], "10");
        assert_eq!(headers[&X_RATELIMIT_REMAINING], "7");
        assert_eq!(headers[&X_RATELIMIT_RESET], "1700001");
    }

    #[test]
    fn test_version_headers() {
        let mut headers = HeaderMap::new();
        let version = ApiVersion::parse("v1").unwrap();
        apply_version(
            &mut headers,
            &version,
            &["v1".to_string(), "v2".to_string()],
            "v2",
        );

        assert_eq!(headers[&API_VERSION], "v1");
        assert_eq!(headers[&API_SUPPORTED_VERSIONS], "v1, v2");
        assert_eq!(headers[&API_LATEST_VERSION], "v2");
    }

    #[test]
    fn test_deprecation_warning_format() {
        let mut headers = HeaderMap::new();
        let info = VersionInfo {
            version: "v1".to_string(),
            is_supported: true,
            is_deprecated: true,
            is_latest: false,
            sunset_unix_secs: None,
            migration_guide: Some("https://example.com/migrate".to_string()),
        };
        deprecation_warning(&mut headers, &info);

        let warning = headers[&axum::http::header::WARNING].to_str().unwrap();
        assert!(warning.starts_with("299 - \"API version v1 is deprecated"));
        assert!(warning.contains("https://example.com/migrate"));
    }
}
