//! Core types for the memsnap checkpoint engine
//!
//! This crate defines the foundational types shared by the memory store and
//! the checkpoint engine:
//! - `SegmentId`: opaque handle for one backing memory segment
//! - `RegionKey`: identity key matching a current region to its copy
//! - Region records: `AttachedRegion`, `CopiedRegion`, `ManagedRegionMap`,
//!   `DesignatedSubsegment`
//! - Thread handles: `ThreadHandle`, `CopiedThreadHandle`
//! - `Error` / `Result`: the crate-wide error type

pub mod error;
pub mod region;
pub mod types;

pub use error::{Error, Result};
pub use region::{AttachedRegion, CopiedRegion, DesignatedSubsegment, ManagedRegionMap};
pub use types::{CopiedThreadHandle, RegionKey, SegmentId, ThreadHandle};
