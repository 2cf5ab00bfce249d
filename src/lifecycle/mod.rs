//! Lifecycle management subsystem.
//!
//! # Design Decisions
//! - Shutdown is explicit: the host calls `Shutdown::trigger` from its own
//!   signal handling; no hooks are registered at load time
//! - Sweep tasks exit promptly on the broadcast signal

pub mod shutdown;

pub use shutdown::Shutdown;
