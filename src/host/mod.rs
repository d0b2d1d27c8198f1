//! Host coordination primitives.
//!
//! Tabs share no memory with each other; the only things they share are a
//! lock manager and a broadcast hub, both supplied by the host. This module
//! defines those seams and in-process implementations of them.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `lock` | Named exclusive locks (leader election) |
//! | `channel` | Named publish/subscribe channels (fan-out) |

// ============================================================================
// Submodules
// ============================================================================

/// Named publish/subscribe channels.
pub mod channel;

/// Named exclusive locks.
pub mod lock;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{BroadcastChannel, BroadcastHub, LocalBroadcastHub};
pub use lock::{LocalLockManager, LockGuard, LockManager, LockSnapshot};
