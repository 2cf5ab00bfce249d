//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     -> loader.rs (parse & deserialize)
//!     -> validation.rs (semantic checks)
//!     -> GovernanceConfig (validated, immutable)
//!     -> shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so a minimal config is valid
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CacheNamespaceConfig, CacheSettings, GovernanceConfig, ListenerConfig, MonitorSettings,
    RateLimitConfig, RateLimitSettings, RouteLimitConfig, VersionEntry, VersioningConfig,
    WindowStrategy,
};
pub use validation::{validate_config, ValidationError};
