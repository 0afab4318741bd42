//! Region records for the three region groups
//!
//! An `AttachedRegion` is owned by the target's session state: it appears on
//! attach and disappears on detach. A `CopiedRegion` is owned by the
//! checkpoint and mirrors exactly one attached region, matched through its
//! `RegionKey`. Managed regions are subdivided into `DesignatedSubsegment`s
//! whose `attached` flag drives the differential copy.

use crate::types::{RegionKey, SegmentId};

/// A region currently mapped into the target's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedRegion {
    /// Backing segment of the region
    pub segment: SegmentId,
    /// Base address relative to the region group
    pub rel_addr: u64,
    /// Size of the region in bytes
    pub size: usize,
}

impl AttachedRegion {
    /// Create a new attached region record
    pub fn new(segment: SegmentId, rel_addr: u64, size: usize) -> Self {
        Self {
            segment,
            rel_addr,
            size,
        }
    }

    /// The identity key matching this region to its checkpoint copy
    pub fn key(&self) -> RegionKey {
        RegionKey::new(self.segment, self.rel_addr)
    }
}

/// A checkpoint-owned mirror of one attached region
///
/// Created by the differ when a new attached region appears with no match;
/// destroyed by the differ (releasing `copy_segment`) when the matching
/// attached region disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopiedRegion {
    /// Identity key of the source region this copy mirrors
    pub source: RegionKey,
    /// Freshly allocated backing segment holding the copied content
    pub copy_segment: SegmentId,
    /// Size of the mirrored region in bytes
    pub size: usize,
    /// Whether the source region was managed at creation time
    pub managed: bool,
}

impl CopiedRegion {
    /// Create a copy record for the given source region
    pub fn new(source: RegionKey, copy_segment: SegmentId, size: usize, managed: bool) -> Self {
        Self {
            source,
            copy_segment,
            size,
            managed,
        }
    }
}

/// One piece of a managed region
///
/// `attached == true` means the subsegment holds content not yet mirrored
/// into the checkpoint. The copy engine clears the flag right after copying
/// the subsegment; an external mutation tracker re-sets it whenever the
/// content changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignatedSubsegment {
    /// Backing segment of this subsegment
    pub segment: SegmentId,
    /// Size of the subsegment in bytes
    pub size: usize,
    /// Offset of the subsegment within its parent region
    pub rel_offset: u64,
    /// Holds content pending copy
    pub attached: bool,
}

impl DesignatedSubsegment {
    /// Create a subsegment record
    pub fn new(segment: SegmentId, size: usize, rel_offset: u64, attached: bool) -> Self {
        Self {
            segment,
            size,
            rel_offset,
            attached,
        }
    }
}

/// The fine-grained composition of one managed region
///
/// Groups the subsegments that together make up one logical attached region
/// with independently attachable and detachable parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedRegionMap {
    /// Subsegments in layout order
    pub subsegments: Vec<DesignatedSubsegment>,
}

impl ManagedRegionMap {
    /// Create an empty managed region map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a managed region map from its subsegments
    pub fn with_subsegments(subsegments: Vec<DesignatedSubsegment>) -> Self {
        Self { subsegments }
    }
}
