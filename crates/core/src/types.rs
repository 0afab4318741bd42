//! Handle types for segments, regions, and threads
//!
//! All handles are small value types. Identity lives in the handle value
//! itself, never in runtime object identity: the memory store keeps a side
//! table from `SegmentId` to the backing resource, and region matching goes
//! through `RegionKey` comparison.

use std::fmt;

/// Opaque handle for one backing memory segment
///
/// Minted by the segment store on allocation. A `SegmentId` stays valid
/// until the segment is freed; holding an id after that is a bookkeeping
/// bug that the store surfaces as `Error::UnknownSegment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u64);

impl SegmentId {
    /// Reconstruct a SegmentId from its raw value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value of this handle
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg:{}", self.0)
    }
}

/// Identity key of a region: backing segment plus relative base address
///
/// Within one region group the key is unique across both the attached and
/// the copied list. The differ and the copy engine match regions to their
/// copies exclusively through this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey {
    /// Backing segment of the source region
    pub segment: SegmentId,
    /// Base address relative to the region group
    pub rel_addr: u64,
}

impl RegionKey {
    /// Create a new region key
    pub fn new(segment: SegmentId, rel_addr: u64) -> Self {
        Self { segment, rel_addr }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.segment, self.rel_addr)
    }
}

/// Opaque identity of one thread of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadHandle(u64);

impl ThreadHandle {
    /// Reconstruct a ThreadHandle from its raw value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value of this handle
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread:{}", self.0)
    }
}

/// Checkpoint-owned duplicate of one thread identity
///
/// A shallow copy: only the identity handle is preserved. Register and
/// execution state capture belongs to the surrounding tool, not to the
/// snapshot engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopiedThreadHandle {
    /// The duplicated thread identity
    pub thread: ThreadHandle,
}

impl CopiedThreadHandle {
    /// Duplicate a thread handle
    pub fn new(thread: ThreadHandle) -> Self {
        Self { thread }
    }
}
