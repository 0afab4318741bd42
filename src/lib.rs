//! memsnap - incremental memory-snapshot engine for process checkpointing
//!
//! memsnap maintains an independent, up-to-date copy of a target process's
//! attached memory regions. Every checkpoint pass reconciles the copy lists
//! against the live attachment lists, allocates backing segments for new
//! regions, releases segments whose source was detached, and re-copies only
//! what changed for managed (subsegmented) regions.
//!
//! # Quick Start
//!
//! ```ignore
//! use memsnap::{AttachedRegion, CheckpointCoordinator, SegmentStore, TargetSession};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SegmentStore::new());
//! let stack = store.alloc(4096)?;
//! let linker = store.alloc(4096)?;
//! let session = Arc::new(TargetSession::new(stack, linker));
//!
//! // The target attaches a region, then a checkpoint mirrors it.
//! let seg = store.alloc(4096)?;
//! session.attach_address_space(AttachedRegion::new(seg, 0x1000, 4096));
//!
//! let coordinator = CheckpointCoordinator::new(store, session);
//! let checkpoint = coordinator.checkpoint()?;
//! assert_eq!(checkpoint.address_space.len(), 1);
//! ```
//!
//! # Architecture
//!
//! The engine is split into three layers: `memsnap-core` (handles, region
//! records, errors), `memsnap-memory` (the segment allocator and scoped
//! mapper), and `memsnap-engine` (differ, copy engine, thread snapshotter,
//! checkpoint coordinator). This facade re-exports the public API.

pub use memsnap_core::{
    AttachedRegion, CopiedRegion, CopiedThreadHandle, DesignatedSubsegment, Error,
    ManagedRegionMap, RegionKey, Result, SegmentId, ThreadHandle,
};
pub use memsnap_engine::{
    CapabilitySnapshot, CapabilitySnapshotter, Checkpoint, CheckpointCoordinator, CopyStats,
    ReconcileStats, RegionGroup, TargetSession, UnimplementedCapabilities,
};
pub use memsnap_memory::SegmentStore;
