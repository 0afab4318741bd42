//! Checkpoint engine: region reconciliation, content copy, coordination
//!
//! One checkpoint pass, run by the [`CheckpointCoordinator`] under a single
//! exclusivity lock, performs in order:
//! 1. Thread snapshot (shallow duplication of thread handles)
//! 2. Capability metadata snapshot (extension point, unimplemented by
//!    default)
//! 3. Region-map synchronization for the three region groups — address
//!    space, stack area, linker area — each via the differ
//!    ([`differ::reconcile`]) and then the copy engine
//!    ([`copier::copy_all`])
//!
//! The differ reconciles the checkpoint's copy list against the target's
//! current attachment list by identity key: stale copies are removed and
//! their backing segments freed, new attachments get a freshly allocated
//! copy. The copy engine then fills copy segments with content — a full
//! re-copy for unmanaged regions, a differential copy of `attached`
//! subsegments for managed ones.

pub mod capability;
pub mod coordinator;
pub mod copier;
pub mod differ;
pub mod session;
pub mod threads;

pub use capability::{CapabilitySnapshot, CapabilitySnapshotter, UnimplementedCapabilities};
pub use coordinator::{Checkpoint, CheckpointCoordinator};
pub use copier::CopyStats;
pub use differ::{ReconcileStats, SkipSet};
pub use session::{ManagedRegistry, RegionGroup, SessionState, TargetSession};
