//! API version extraction and compatibility checking.
//!
//! # Responsibilities
//! - Resolve the requested version from a request (path, header, query,
//!   Accept media type, then the configured default)
//! - Validate the version against the compatibility table
//! - Derive `VersionInfo` on demand from the table
//!
//! # Design Decisions
//! - Extraction precedence is fixed: the first well-formed signal wins and
//!   malformed signals fall through to the next source
//! - The negotiator holds no per-request state; everything it returns is a
//!   pure function of the request and the table

use axum::http::{HeaderMap, Uri};
use serde::Serialize;

use crate::clock;
use crate::config::{VersionEntry, VersioningConfig};
use crate::error::GovernanceError;

/// Header carrying an explicit version request.
pub const VERSION_HEADER: &str = "x-api-version";

/// Query parameter carrying an explicit version request.
pub const VERSION_QUERY_PARAM: &str = "api-version";

/// A normalized API version ("v1", "v2", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ApiVersion(String);

impl ApiVersion {
    /// Parse a raw signal. Accepts "v2", "V2" and bare "2"; anything else is
    /// not a version signal.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().to_ascii_lowercase();
        let digits = trimmed.strip_prefix('v').unwrap_or(&trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(format!("v{digits}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derived view of one version, computed on demand from the table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub is_supported: bool,
    pub is_deprecated: bool,
    pub is_latest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset_unix_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_guide: Option<String>,
}

/// Resolves and validates requested versions against the compatibility table.
pub struct Negotiator {
    config: VersioningConfig,
}

impl Negotiator {
    pub fn new(config: VersioningConfig) -> Self {
        Self { config }
    }

    pub fn default_version(&self) -> ApiVersion {
        ApiVersion(self.config.default.clone())
    }

    pub fn latest(&self) -> &str {
        &self.config.latest
    }

    pub fn supported_versions(&self) -> Vec<String> {
        self.config
            .versions
            .iter()
            .map(|e| e.version.clone())
            .collect()
    }

    fn entry(&self, version: &ApiVersion) -> Option<&VersionEntry> {
        self.config
            .versions
            .iter()
            .find(|e| e.version == version.as_str())
    }

    /// Resolve the requested version. Precedence: URL path segment, version
    /// header, query parameter, Accept media-type suffix, configured default.
    pub fn extract(&self, uri: &Uri, headers: &HeaderMap) -> ApiVersion {
        if let Some(v) = Self::from_path(uri.path()) {
            return v;
        }
        if let Some(v) = headers
            .get(VERSION_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(ApiVersion::parse)
        {
            return v;
        }
        if let Some(v) = Self::from_query(uri.query().unwrap_or_default()) {
            return v;
        }
        if let Some(v) = headers
            .get(axum::http::header::ACCEPT)
            .and_then(|h| h.to_str().ok())
            .and_then(Self::from_accept)
        {
            return v;
        }
        self.default_version()
    }

    /// First path segment that looks like a version ("/api/v2/users" -> v2).
    fn from_path(path: &str) -> Option<ApiVersion> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .find_map(|segment| {
                let candidate = ApiVersion::parse(segment)?;
                // Only "vN"-shaped segments count; a bare numeric segment is
                // an identifier, not a version.
                segment.to_ascii_lowercase().starts_with('v').then_some(candidate)
            })
    }

    fn from_query(query: &str) -> Option<ApiVersion> {
        query.split('&').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == VERSION_QUERY_PARAM)
                .then(|| ApiVersion::parse(value))
                .flatten()
        })
    }

    /// Structured media-type signals: a `version=N` parameter or a
    /// `.vN+json` suffix, e.g. `application/vnd.api.v2+json`.
    fn from_accept(accept: &str) -> Option<ApiVersion> {
        for part in accept.split(',') {
            for param in part.split(';').skip(1) {
                if let Some((name, value)) = param.split_once('=') {
                    if name.trim().eq_ignore_ascii_case("version") {
                        if let Some(v) = ApiVersion::parse(value.trim().trim_matches('"')) {
                            return Some(v);
                        }
                    }
                }
            }
            let media_type = part.split(';').next().unwrap_or("");
            if let Some(rest) = media_type.trim().strip_suffix("+json") {
                if let Some(idx) = rest.rfind(".v") {
                    if let Some(v) = ApiVersion::parse(&rest[idx + 1..]) {
                        return Some(v);
                    }
                }
            }
        }
        None
    }

    /// Derived view of a version; unknown versions report unsupported.
    pub fn info(&self, version: &ApiVersion) -> VersionInfo {
        match self.entry(version) {
            Some(entry) => VersionInfo {
                version: entry.version.clone(),
                is_supported: true,
                is_deprecated: entry.deprecated,
                is_latest: entry.version == self.config.latest,
                sunset_unix_secs: entry.sunset_unix_secs,
                migration_guide: entry.migration_guide.clone(),
            },
            None => VersionInfo {
                version: version.to_string(),
                is_supported: false,
                is_deprecated: false,
                is_latest: false,
                sunset_unix_secs: None,
                migration_guide: None,
            },
        }
    }

    /// Reject unsupported and sunset versions. Deprecated versions pass; the
    /// HTTP layer attaches the warning.
    pub fn check(&self, version: &ApiVersion) -> Result<(), GovernanceError> {
        self.check_at(version, clock::now_secs())
    }

    pub(crate) fn check_at(
        &self,
        version: &ApiVersion,
        now_secs: u64,
    ) -> Result<(), GovernanceError> {
        let Some(entry) = self.entry(version) else {
            return Err(GovernanceError::VersionNotSupported {
                version: version.to_string(),
                supported: self.supported_versions(),
            });
        };
        if let Some(sunset) = entry.sunset_unix_secs {
            if now_secs >= sunset {
                return Err(GovernanceError::VersionSunset {
                    version: version.to_string(),
                    sunset_unix_secs: sunset,
                    migration_guide: entry.migration_guide.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn negotiator() -> Negotiator {
        Negotiator::new(VersioningConfig::default())
    }

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(ApiVersion::parse("v2").unwrap().as_str(), "v2");
        assert_eq!(ApiVersion::parse("V2").unwrap().as_str(), "v2");
        assert_eq!(ApiVersion::parse("2").unwrap().as_str(), "v2");
        assert!(ApiVersion::parse("latest").is_none());
        assert!(ApiVersion::parse("v").is_none());
        assert!(ApiVersion::parse("").is_none());
    }

    #[test]
    fn test_precedence_path_beats_everything() {
        let negotiator = negotiator();
        let mut headers = HeaderMap::new();
        headers.insert(VERSION_HEADER, HeaderValue::from_static("v2"));

        let v = negotiator.extract(&uri("/api/v1/users?api-version=v2"), &headers);
        assert_eq!(v.as_str(), "v1");
    }

    #[test]
    fn test_precedence_falls_through_header_query_default() {
        let negotiator = negotiator();

        // No path signal: header wins.
        let mut headers = HeaderMap::new();
        headers.insert(VERSION_HEADER, HeaderValue::from_static("v1"));
        let v = negotiator.extract(&uri("/api/users?api-version=v2"), &headers);
        assert_eq!(v.as_str(), "v1");

        // No header: query wins.
        let v = negotiator.extract(&uri("/api/users?api-version=v1"), &HeaderMap::new());
        assert_eq!(v.as_str(), "v1");

        // Nothing at all: default.
        let v = negotiator.extract(&uri("/api/users"), &HeaderMap::new());
        assert_eq!(v.as_str(), "v2");
    }

    #[test]
    fn test_accept_header_signals() {
        let negotiator = negotiator();

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::ACCEPT,
            HeaderValue::from_static("application/json; version=1"),
        );
        let v = negotiator.extract(&uri("/api/users"), &headers);
        assert_eq!(v.as_str(), "v1");

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::ACCEPT,
            HeaderValue::from_static("application/vnd.api.v1+json"),
        );
        let v = negotiator.extract(&uri("/api/users"), &headers);
        assert_eq!(v.as_str(), "v1");
    }

    #[test]
    fn test_numeric_path_segment_is_not_a_version() {
        let negotiator = negotiator();
        let v = negotiator.extract(&uri("/api/users/42"), &HeaderMap::new());
        assert_eq!(v.as_str(), "v2");
    }

    #[test]
    fn test_info_derivation() {
        let negotiator = negotiator();

        let info = negotiator.info(&ApiVersion::parse("v1").unwrap());
        assert!(info.is_supported);
        assert!(info.is_deprecated);
        assert!(!info.is_latest);

        let info = negotiator.info(&ApiVersion::parse("v2").unwrap());
        assert!(info.is_latest);

        let info = negotiator.info(&ApiVersion::parse("v9").unwrap());
        assert!(!info.is_supported);
    }

    #[test]
    fn test_check_rejects_unsupported() {
        let negotiator = negotiator();
        let err = negotiator
            .check_at(&ApiVersion::parse("v9").unwrap(), 0)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::VersionNotSupported { .. }));
    }

    #[test]
    fn test_check_rejects_after_sunset() {
        let mut config = VersioningConfig::default();
        config.versions[0].sunset_unix_secs = Some(1000);
        let negotiator = Negotiator::new(config);
        let v1 = ApiVersion::parse("v1").unwrap();

        assert!(negotiator.check_at(&v1, 999).is_ok());
        let err = negotiator.check_at(&v1, 1000).unwrap_err();
        assert!(matches!(err, GovernanceError::VersionSunset { .. }));
    }

    #[test]
    fn test_deprecated_version_passes_check() {
        let negotiator = negotiator();
        assert!(negotiator
            .check_at(&ApiVersion::parse("v1").unwrap(), 0)
            .is_ok());
    }
}
