//! Checkpoint coordinator: one checkpoint pass under one lock
//!
//! The coordinator owns the persistent copy lists, carried across calls so
//! reconciliation stays incremental. A pass runs thread snapshot, the
//! capability extension point, and then diff + copy for the three region
//! groups, all while holding both the coordinator's exclusivity lock and
//! the session lock — concurrent checkpoints serialize completely, and
//! attach/detach cannot interleave with a running pass.
//!
//! Failure policy: consistency errors during the copy phase are logged and
//! counted, and the remaining groups still execute. Allocation exhaustion
//! aborts the call; segments already allocated in the failing pass are not
//! rolled back (they stay keyed in the copy lists and are reclaimed by a
//! later successful reconciliation, or leak).

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::smallvec;
use tracing::debug;

use memsnap_core::{AttachedRegion, CopiedRegion, CopiedThreadHandle, Result};
use memsnap_memory::SegmentStore;

use crate::capability::{CapabilitySnapshot, CapabilitySnapshotter, UnimplementedCapabilities};
use crate::copier;
use crate::differ::{self, SkipSet};
use crate::session::{ManagedRegistry, SessionState, TargetSession};
use crate::threads;

/// Self-contained output of one checkpoint pass
///
/// Each copied region carries its backing segment handle, source identity
/// key, and managed flag — enough for the restore collaborator to
/// reconstruct the original layout.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// Monotonic checkpoint sequence number (first pass is 1)
    pub sequence: u64,
    /// Copied thread identities, in target list order
    pub threads: Vec<CopiedThreadHandle>,
    /// Copies of the address-space group
    pub address_space: Vec<CopiedRegion>,
    /// Copies of the stack-area group
    pub stack_area: Vec<CopiedRegion>,
    /// Copies of the linker-area group
    pub linker_area: Vec<CopiedRegion>,
    /// Outcome of the capability snapshot step
    pub capabilities: CapabilitySnapshot,
}

/// Coordinator state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoordinatorState {
    Idle,
    Checkpointing,
}

struct CoordinatorInner {
    state: CoordinatorState,
    sequence: u64,
    copied_threads: Vec<CopiedThreadHandle>,
    copied_address_space: Vec<CopiedRegion>,
    copied_stack: Vec<CopiedRegion>,
    copied_linker: Vec<CopiedRegion>,
}

/// Orchestrates checkpoint passes against one target session
pub struct CheckpointCoordinator {
    store: Arc<SegmentStore>,
    session: Arc<TargetSession>,
    capabilities: Box<dyn CapabilitySnapshotter>,
    inner: Mutex<CoordinatorInner>,
}

impl CheckpointCoordinator {
    /// Create a coordinator with the default (unimplemented) capability
    /// snapshotter
    pub fn new(store: Arc<SegmentStore>, session: Arc<TargetSession>) -> Self {
        Self::with_capability_snapshotter(store, session, Box::new(UnimplementedCapabilities))
    }

    /// Create a coordinator with a custom capability snapshotter
    pub fn with_capability_snapshotter(
        store: Arc<SegmentStore>,
        session: Arc<TargetSession>,
        capabilities: Box<dyn CapabilitySnapshotter>,
    ) -> Self {
        CheckpointCoordinator {
            store,
            session,
            capabilities,
            inner: Mutex::new(CoordinatorInner {
                state: CoordinatorState::Idle,
                sequence: 0,
                copied_threads: Vec::new(),
                copied_address_space: Vec::new(),
                copied_stack: Vec::new(),
                copied_linker: Vec::new(),
            }),
        }
    }

    /// Whether no checkpoint pass is currently running
    pub fn is_idle(&self) -> bool {
        self.inner.lock().state == CoordinatorState::Idle
    }

    /// Sequence number of the last completed pass (0 before the first)
    pub fn last_sequence(&self) -> u64 {
        self.inner.lock().sequence
    }

    /// Run one checkpoint pass and return its output
    ///
    /// # Errors
    /// `Error::OutOfMemory` if allocating a copy segment fails; the pass is
    /// aborted without rollback of earlier allocations.
    pub fn checkpoint(&self) -> Result<Checkpoint> {
        let mut inner = self.inner.lock();
        inner.state = CoordinatorState::Checkpointing;
        let result = self.run_pass(&mut inner);
        inner.state = CoordinatorState::Idle;
        result
    }

    fn run_pass(&self, inner: &mut CoordinatorInner) -> Result<Checkpoint> {
        let mut session = self.session.lock();
        let state: &mut SessionState = &mut session;

        inner.sequence += 1;
        let sequence = inner.sequence;
        debug!(target: "memsnap::checkpoint", sequence, "checkpoint started");

        // 1. Thread snapshot. The snapshotter only appends; clearing here
        // keeps repeated passes duplicate-free.
        inner.copied_threads.clear();
        threads::snapshot_into(&state.threads, &mut inner.copied_threads);

        // 2. Capability metadata (extension point, loud no-op by default).
        let capabilities = self.capabilities.snapshot(state);

        // 3. Region-map synchronization, one group at a time. The reserved
        // stack/linker backing handles appear in the address space but are
        // covered by their own groups.
        let address_skip: SkipSet = smallvec![state.stack_handle, state.linker_handle];
        Self::sync_group(
            "address_space",
            sequence,
            &mut inner.copied_address_space,
            &state.address_space,
            &address_skip,
            &mut state.managed,
            &self.store,
        )?;
        Self::sync_group(
            "stack_area",
            sequence,
            &mut inner.copied_stack,
            &state.stack_area,
            &SkipSet::new(),
            &mut state.managed,
            &self.store,
        )?;
        Self::sync_group(
            "linker_area",
            sequence,
            &mut inner.copied_linker,
            &state.linker_area,
            &SkipSet::new(),
            &mut state.managed,
            &self.store,
        )?;

        debug!(target: "memsnap::checkpoint", sequence, "checkpoint finished");

        Ok(Checkpoint {
            sequence,
            threads: inner.copied_threads.clone(),
            address_space: inner.copied_address_space.clone(),
            stack_area: inner.copied_stack.clone(),
            linker_area: inner.copied_linker.clone(),
            capabilities,
        })
    }

    fn sync_group(
        group: &'static str,
        sequence: u64,
        copies: &mut Vec<CopiedRegion>,
        current: &[AttachedRegion],
        skip: &SkipSet,
        managed: &mut ManagedRegistry,
        store: &SegmentStore,
    ) -> Result<()> {
        let reconcile_stats = differ::reconcile(copies, current, skip, managed, store)?;
        let copy_stats = copier::copy_all(copies, current, skip, managed, store);
        debug!(
            target: "memsnap::checkpoint",
            sequence,
            group,
            created = reconcile_stats.created,
            deleted = reconcile_stats.deleted,
            regions_copied = copy_stats.regions_copied,
            subsegments_copied = copy_stats.subsegments_copied,
            subsegments_skipped = copy_stats.subsegments_skipped,
            missing_copies = copy_stats.missing_copies,
            failed = copy_stats.failed,
            "region group synchronized"
        );
        Ok(())
    }
}

impl std::fmt::Debug for CheckpointCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CheckpointCoordinator")
            .field("state", &inner.state)
            .field("sequence", &inner.sequence)
            .field("copied_address_space", &inner.copied_address_space.len())
            .field("copied_stack", &inner.copied_stack.len())
            .field("copied_linker", &inner.copied_linker.len())
            .finish()
    }
}
