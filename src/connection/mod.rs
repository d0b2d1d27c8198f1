//! Shared connection module.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SharedConnection`] | One tab's handle on the shared stream for a URL |
//! | [`ConnectionConfig`] | Callbacks and passthrough request options |
//! | [`ConnectionState`] | `Connecting` → `Open` → `Closed` |
//! | [`InstanceRegistry`] | One live connection per URL per tab |
//!
//! Leader election lives in the private `election` submodule.

// ============================================================================
// Submodules
// ============================================================================

/// Connection configuration.
pub mod config;

/// Shared connection lifecycle.
pub mod core;

/// Leader election task.
mod election;

/// Per-tab instance registry.
pub mod registry;

/// Connection lifecycle state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::ConnectionConfig;
pub use core::SharedConnection;
pub use registry::InstanceRegistry;
pub use state::ConnectionState;
