//! Region differ: reconcile a copy list against the current attachments
//!
//! Deletion always precedes creation within one pass, so a region that
//! vanished and was replaced by a different region at the same address is
//! never mistaken for a still-valid copy.
//!
//! Duplicate identity keys inside the current list are a caller invariant
//! guaranteed by the attach mechanism; they are not re-checked here.

use smallvec::SmallVec;
use tracing::warn;

use memsnap_core::{AttachedRegion, CopiedRegion, Result, SegmentId};
use memsnap_memory::SegmentStore;

use crate::session::ManagedRegistry;

/// Backing handles excluded from a group's reconciliation
///
/// Holds at most the two reserved handles (stack-area and linker-area
/// dataspaces), which are covered by their own dedicated groups.
pub type SkipSet = SmallVec<[SegmentId; 2]>;

/// Outcome counts of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Copies created for newly attached regions
    pub created: usize,
    /// Stale copies removed (backing segments freed)
    pub deleted: usize,
}

/// Reconcile `copies` against `current` in place
///
/// 1. Deletion pass: every copy whose identity key has no match in
///    `current` is removed and its backing segment freed, so copies never
///    outlive their source.
/// 2. Creation pass: every attached region whose backing handle is in
///    `skip` is ignored; for the rest, a missing copy gets a fresh backing
///    segment sized to match, with the managed flag taken from the registry.
///
/// Insertion order of `copies` is preserved. Absence of a match is the
/// normal create/delete case, not an error; the only failure is allocation
/// exhaustion, which propagates as the hard failure of the checkpoint call.
pub fn reconcile(
    copies: &mut Vec<CopiedRegion>,
    current: &[AttachedRegion],
    skip: &SkipSet,
    managed: &ManagedRegistry,
    store: &SegmentStore,
) -> Result<ReconcileStats> {
    let mut stats = ReconcileStats::default();

    // Deletion pass.
    let mut stale: Vec<SegmentId> = Vec::new();
    copies.retain(|copy| {
        let live = current.iter().any(|region| region.key() == copy.source);
        if !live {
            stale.push(copy.copy_segment);
        }
        live
    });
    for segment in stale {
        stats.deleted += 1;
        if let Err(err) = store.free(segment) {
            warn!(target: "memsnap::differ", %segment, %err, "failed to free stale copy segment");
        }
    }

    // Creation pass.
    for region in current {
        if skip.contains(&region.segment) {
            continue;
        }
        if copies.iter().any(|copy| copy.source == region.key()) {
            continue;
        }
        let copy_segment = store.alloc(region.size)?;
        let is_managed = managed.contains_key(&region.segment);
        copies.push(CopiedRegion::new(
            region.key(),
            copy_segment,
            region.size,
            is_managed,
        ));
        stats.created += 1;
    }

    Ok(stats)
}
