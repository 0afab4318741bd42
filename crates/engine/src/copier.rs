//! Region copy engine: fill copy segments with content
//!
//! Runs after the differ, so every attached region is expected to have a
//! matching copy. Unmanaged regions are re-copied in full on every pass;
//! managed regions copy only the subsegments flagged `attached`, clearing
//! the flag right after each subsegment's copy (differential copy).
//!
//! Copy failures are best-effort: a missing copy or a dead handle is logged
//! and counted, and processing continues with the remaining regions.

use tracing::{error, warn};

use memsnap_core::{AttachedRegion, CopiedRegion};
use memsnap_memory::SegmentStore;

use crate::differ::SkipSet;
use crate::session::ManagedRegistry;

/// Outcome counts of one copy pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Regions whose content was processed (managed or unmanaged)
    pub regions_copied: usize,
    /// Managed subsegments copied because they were flagged attached
    pub subsegments_copied: usize,
    /// Managed subsegments skipped because they were already mirrored
    pub subsegments_skipped: usize,
    /// Attached regions with no matching copy (consistency errors)
    pub missing_copies: usize,
    /// Byte copies that failed on a dead handle or bounds
    pub failed: usize,
}

/// Copy content for every attached region into its matching copy
///
/// Regions whose backing handle is in `skip` belong to a dedicated group
/// and are ignored here. For the rest, a missing copy should be impossible
/// given diff-before-copy ordering; it is reported as a diagnostic and the
/// pass continues.
pub fn copy_all(
    copies: &[CopiedRegion],
    current: &[AttachedRegion],
    skip: &SkipSet,
    managed: &mut ManagedRegistry,
    store: &SegmentStore,
) -> CopyStats {
    let mut stats = CopyStats::default();

    for region in current {
        if skip.contains(&region.segment) {
            continue;
        }

        let Some(copy) = copies.iter().find(|c| c.source == region.key()) else {
            error!(
                target: "memsnap::copier",
                key = %region.key(),
                "attached region has no matching copy"
            );
            stats.missing_copies += 1;
            continue;
        };

        match managed.get_mut(&region.segment) {
            Some(map) => {
                // Differential copy: only subsegments holding unsynced
                // content, flag cleared immediately after each copy.
                for sub in &mut map.subsegments {
                    if !sub.attached {
                        stats.subsegments_skipped += 1;
                        continue;
                    }
                    match store.copy_bytes(
                        sub.segment,
                        copy.copy_segment,
                        sub.size,
                        sub.rel_offset as usize,
                    ) {
                        Ok(()) => {
                            sub.attached = false;
                            stats.subsegments_copied += 1;
                        }
                        Err(err) => {
                            warn!(
                                target: "memsnap::copier",
                                subsegment = %sub.segment,
                                copy = %copy.copy_segment,
                                %err,
                                "subsegment copy failed"
                            );
                            stats.failed += 1;
                        }
                    }
                }
                stats.regions_copied += 1;
            }
            None => {
                // Full unconditional re-copy, source offset 0 to
                // destination offset 0.
                match store.copy_bytes(region.segment, copy.copy_segment, region.size, 0) {
                    Ok(()) => stats.regions_copied += 1,
                    Err(err) => {
                        warn!(
                            target: "memsnap::copier",
                            key = %region.key(),
                            copy = %copy.copy_segment,
                            %err,
                            "region copy failed"
                        );
                        stats.failed += 1;
                    }
                }
            }
        }
    }

    stats
}
