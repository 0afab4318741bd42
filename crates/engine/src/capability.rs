//! Capability metadata snapshot extension point
//!
//! Duplicating capability metadata is not implemented. The gap must stay
//! visible to callers relying on full-state capture, so the default
//! implementation emits a diagnostic on every checkpoint instead of
//! silently skipping. A surrounding tool that does track capability
//! metadata swaps in its own [`CapabilitySnapshotter`].

use tracing::warn;

use crate::session::SessionState;

/// Result of the capability snapshot step of one checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySnapshot {
    /// No capability metadata was captured
    Unimplemented,
    /// Metadata captured by a custom snapshotter
    Captured {
        /// Number of capability entries captured
        entries: usize,
    },
}

/// Extension point for duplicating capability metadata
pub trait CapabilitySnapshotter: Send + Sync {
    /// Snapshot the target's capability metadata
    fn snapshot(&self, state: &SessionState) -> CapabilitySnapshot;
}

/// Default snapshotter: a loud no-op
#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedCapabilities;

impl CapabilitySnapshotter for UnimplementedCapabilities {
    fn snapshot(&self, _state: &SessionState) -> CapabilitySnapshot {
        warn!(
            target: "memsnap::checkpoint",
            "capability metadata snapshot is not implemented; checkpoint omits capability state"
        );
        CapabilitySnapshot::Unimplemented
    }
}
