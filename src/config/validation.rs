//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default/latest versions exist in the table)
//! - Validate value ranges (windows > 0, percentages in range)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GovernanceConfig -> Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::GovernanceConfig;

/// A single semantic defect in a configuration.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{section}: {field} must be greater than zero")]
    ZeroValue {
        section: &'static str,
        field: String,
    },

    #[error("monitor: {field} must be in (0, 100], got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },

    #[error("versioning: {role} version \"{version}\" is not in the version table")]
    UnknownVersion {
        role: &'static str,
        version: String,
    },

    #[error("versioning: version table entry {index} has an empty version string")]
    EmptyVersion { index: usize },

    #[error("versioning: version table is empty")]
    NoVersions,

    #[error("rate_limit: route override {index} has an empty path_prefix")]
    EmptyRoutePrefix { index: usize },
}

/// Validate a configuration, collecting every defect found.
pub fn validate_config(config: &GovernanceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_rate_limit(config, &mut errors);
    validate_cache(config, &mut errors);
    validate_monitor(config, &mut errors);
    validate_versioning(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_rate_limit(config: &GovernanceConfig, errors: &mut Vec<ValidationError>) {
    let rl = &config.rate_limit;
    if rl.default.max_requests == 0 {
        errors.push(ValidationError::ZeroValue {
            section: "rate_limit",
            field: "max_requests".into(),
        });
    }
    if rl.default.window_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            section: "rate_limit",
            field: "window_ms".into(),
        });
    }
    if rl.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            section: "rate_limit",
            field: "sweep_interval_secs".into(),
        });
    }
    for (i, route) in rl.routes.iter().enumerate() {
        if route.path_prefix.is_empty() {
            errors.push(ValidationError::EmptyRoutePrefix { index: i });
        }
        if route.limit.max_requests == 0 {
            errors.push(ValidationError::ZeroValue {
                section: "rate_limit",
                field: format!("routes[{i}].max_requests"),
            });
        }
        if route.limit.window_ms == 0 {
            errors.push(ValidationError::ZeroValue {
                section: "rate_limit",
                field: format!("routes[{i}].window_ms"),
            });
        }
    }
}

fn validate_cache(config: &GovernanceConfig, errors: &mut Vec<ValidationError>) {
    let cache = &config.cache;
    if cache.default_ttl_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            section: "cache",
            field: "default_ttl_ms".into(),
        });
    }
    if cache.default_max_size == 0 {
        errors.push(ValidationError::ZeroValue {
            section: "cache",
            field: "default_max_size".into(),
        });
    }
    if cache.default_cleanup_interval_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            section: "cache",
            field: "default_cleanup_interval_secs".into(),
        });
    }
    for (name, ns) in &cache.namespaces {
        if ns.ttl_ms == Some(0) {
            errors.push(ValidationError::ZeroValue {
                section: "cache",
                field: format!("namespaces.{name}.ttl_ms"),
            });
        }
        if ns.max_size == Some(0) {
            errors.push(ValidationError::ZeroValue {
                section: "cache",
                field: format!("namespaces.{name}.max_size"),
            });
        }
        if ns.cleanup_interval_secs == Some(0) {
            errors.push(ValidationError::ZeroValue {
                section: "cache",
                field: format!("namespaces.{name}.cleanup_interval_secs"),
            });
        }
    }
}

fn validate_monitor(config: &GovernanceConfig, errors: &mut Vec<ValidationError>) {
    let monitor = &config.monitor;
    if monitor.slow_request_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            section: "monitor",
            field: "slow_request_ms".into(),
        });
    }
    for (field, value) in [
        ("memory_percent", monitor.memory_percent),
        ("error_rate_percent", monitor.error_rate_percent),
    ] {
        if value <= 0.0 || value > 100.0 {
            errors.push(ValidationError::PercentOutOfRange { field, value });
        }
    }
    for (field, value) in [
        ("metric_buffer", monitor.metric_buffer),
        ("error_buffer", monitor.error_buffer),
        ("alert_buffer", monitor.alert_buffer),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue {
                section: "monitor",
                field: field.into(),
            });
        }
    }
    if monitor.error_window_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            section: "monitor",
            field: "error_window_secs".into(),
        });
    }
}

fn validate_versioning(config: &GovernanceConfig, errors: &mut Vec<ValidationError>) {
    let versioning = &config.versioning;
    if versioning.versions.is_empty() {
        errors.push(ValidationError::NoVersions);
        return;
    }
    for (i, entry) in versioning.versions.iter().enumerate() {
        if entry.version.trim().is_empty() {
            errors.push(ValidationError::EmptyVersion { index: i });
        }
    }
    let known = |v: &str| versioning.versions.iter().any(|e| e.version == v);
    if !known(&versioning.default) {
        errors.push(ValidationError::UnknownVersion {
            role: "default",
            version: versioning.default.clone(),
        });
    }
    if !known(&versioning.latest) {
        errors.push(ValidationError::UnknownVersion {
            role: "latest",
            version: versioning.latest.clone(),
        });
    }
}
