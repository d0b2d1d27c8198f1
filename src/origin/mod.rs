//! Origin and tab module.
//!
//! This module is the composition root: it wires host capabilities into
//! tabs and constructs connections.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Origin`] | Lock manager, broadcast hub and transport shared by tabs |
//! | [`OriginBuilder`] | Fluent configuration builder |
//! | [`Tab`] | One browsing context; owns an instance registry |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shared_connection::{ConnectionConfig, LoopbackTransport, Origin};
//!
//! # async fn example() -> shared_connection::Result<()> {
//! let origin = Origin::local(Arc::new(LoopbackTransport::new()));
//! let tab = origin.tab();
//!
//! let connection = tab.connect(
//!     "https://example.com/events",
//!     ConnectionConfig::new().on_message(|event| println!("{}", event.data)),
//! )?;
//!
//! connection.close();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for origin configuration.
pub mod builder;

/// Core origin implementation.
pub mod core;

/// Tabs and connection construction.
pub mod tab;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::OriginBuilder;
pub use core::Origin;
pub use tab::Tab;
