//! Configuration schema definitions.
//!
//! This module defines the complete configuration surface of the governance
//! layer. All knobs are plain numeric/string values; all types derive Serde
//! traits for deserialization from config files, and every section has
//! defaults so a minimal (or empty) config is valid.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the governance layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Listener settings for the demo binary.
    pub listener: ListenerConfig,

    /// Rate limiting windows, default and per-route.
    pub rate_limit: RateLimitSettings,

    /// Cache namespace policies.
    pub cache: CacheSettings,

    /// Performance monitor thresholds and buffer capacities.
    pub monitor: MonitorSettings,

    /// API version compatibility table.
    pub versioning: VersioningConfig,

    /// Logging and operational-metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration (demo binary only; the library itself binds nothing).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Window accounting strategy for the request limiter.
///
/// Both strategies prune a per-key timestamp list; they differ only in how
/// callers key them. Fixed-window tolerates up to `2 x max_requests` in a
/// burst straddling a window edge; sliding-window does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowStrategy {
    #[default]
    Fixed,
    Sliding,
}

/// A single rate-limit window: how many requests per how long.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per window.
    pub max_requests: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_ms: 60_000,
        }
    }
}

/// Per-route override, matched by path prefix (longest prefix wins).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteLimitConfig {
    /// Path prefix this window applies to.
    pub path_prefix: String,

    #[serde(flatten)]
    pub limit: RateLimitConfig,
}

/// Rate limiting settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Window accounting strategy used by the middleware.
    pub strategy: WindowStrategy,

    /// Default window applied when no route override matches.
    #[serde(flatten)]
    pub default: RateLimitConfig,

    /// Per-route overrides.
    pub routes: Vec<RouteLimitConfig>,

    /// How often expired per-key records are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            strategy: WindowStrategy::Fixed,
            default: RateLimitConfig::default(),
            routes: Vec::new(),
            sweep_interval_secs: 60,
        }
    }
}

impl RateLimitSettings {
    /// Resolve the window for a request path. Longest matching prefix wins;
    /// falls back to the default window.
    pub fn config_for(&self, path: &str) -> RateLimitConfig {
        self.routes
            .iter()
            .filter(|r| path.starts_with(&r.path_prefix))
            .max_by_key(|r| r.path_prefix.len())
            .map(|r| r.limit)
            .unwrap_or(self.default)
    }
}

/// Policy for one cache namespace.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheNamespaceConfig {
    /// Entry time-to-live in milliseconds.
    pub ttl_ms: Option<u64>,

    /// Maximum entry count before LRU eviction.
    pub max_size: Option<usize>,

    /// Background expiry sweep interval in seconds.
    pub cleanup_interval_secs: Option<u64>,
}

/// Cache settings: defaults plus per-namespace policies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub default_ttl_ms: u64,
    pub default_max_size: usize,
    pub default_cleanup_interval_secs: u64,

    /// Per-namespace policy overrides, keyed by namespace name.
    pub namespaces: HashMap<String, CacheNamespaceConfig>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_ms: 300_000,
            default_max_size: 1000,
            default_cleanup_interval_secs: 60,
            namespaces: HashMap::new(),
        }
    }
}

/// Performance monitor thresholds and retention.
///
/// Buffer capacities are explicit configuration: the monitor reasons over a
/// recent window, not all-time history, and silently drops the oldest entry
/// once a buffer is full.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Requests slower than this raise a warning alert, in milliseconds.
    pub slow_request_ms: u64,

    /// Heap-used / heap-total percentage above which a critical alert fires.
    pub memory_percent: f64,

    /// Trailing-window error-rate percentage above which a critical alert fires.
    pub error_rate_percent: f64,

    /// Trailing window for error-rate computation, in seconds.
    pub error_window_secs: u64,

    /// Ring-buffer capacity for request metrics.
    pub metric_buffer: usize,

    /// Ring-buffer capacity for error metrics.
    pub error_buffer: usize,

    /// Ring-buffer capacity for alerts.
    pub alert_buffer: usize,

    /// Minimum seconds between alerts sharing a title while one is unresolved.
    pub alert_cooldown_secs: u64,

    /// Unresolved warning/critical alerts within this window mark overall
    /// health as degraded, in seconds.
    pub degraded_window_secs: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            slow_request_ms: 2000,
            memory_percent: 80.0,
            error_rate_percent: 5.0,
            error_window_secs: 300,
            metric_buffer: 1000,
            error_buffer: 500,
            alert_buffer: 200,
            alert_cooldown_secs: 60,
            degraded_window_secs: 600,
        }
    }
}

/// One row of the version compatibility table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionEntry {
    /// Version identifier (e.g., "v1").
    pub version: String,

    /// Deprecated versions still work but attach a warning.
    #[serde(default)]
    pub deprecated: bool,

    /// Unix seconds after which requests for this version are rejected.
    #[serde(default)]
    pub sunset_unix_secs: Option<u64>,

    /// Migration guide URL surfaced in deprecation/sunset responses.
    #[serde(default)]
    pub migration_guide: Option<String>,
}

/// API version compatibility table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Version assumed when a request carries no version signal.
    pub default: String,

    /// Latest version, advertised via `API-Latest-Version`.
    pub latest: String,

    /// Supported versions.
    pub versions: Vec<VersionEntry>,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            default: "v2".to_string(),
            latest: "v2".to_string(),
            versions: vec![
                VersionEntry {
                    version: "v1".to_string(),
                    deprecated: true,
                    sunset_unix_secs: None,
                    migration_guide: None,
                },
                VersionEntry {
                    version: "v2".to_string(),
                    deprecated: false,
                    sunset_unix_secs: None,
                    migration_guide: None,
                },
            ],
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics exporter.
    pub metrics_enabled: bool,

    /// Address for the metrics exporter to listen on.
    pub metrics_address: String,

    /// Default tracing filter when RUST_LOG is unset.
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
            log_filter: "api_governance=debug".to_string(),
        }
    }
}
