//! API version negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     -> extract (path > header > query > Accept > default)
//!     -> check against compatibility table (400 unsupported, 410 sunset)
//!     -> deprecated: Warning header + audit log, request proceeds
//!
//! Outbound response
//!     -> transform payload to the requested envelope shape (pure, idempotent)
//!     -> API-Version / API-Supported-Versions / API-Latest-Version headers
//! ```

pub mod negotiator;
pub mod transform;

pub use negotiator::{ApiVersion, Negotiator, VersionInfo, VERSION_HEADER, VERSION_QUERY_PARAM};
pub use transform::transform;
