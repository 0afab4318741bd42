//! Target session state consumed by the checkpoint engine
//!
//! The session owns everything the target side mutates: the thread list,
//! the three attachment lists, the managed-region registry, and the two
//! reserved backing handles for the stack-area and linker-area dataspaces.
//!
//! All of it sits behind one mutex. The coordinator holds that mutex for an
//! entire checkpoint pass, and every mutator here takes it too, so the
//! differ never observes a list mid-mutation: attach/detach and checkpoint
//! serialize against each other.

use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use memsnap_core::{AttachedRegion, ManagedRegionMap, RegionKey, SegmentId, ThreadHandle};

/// Side table from backing-segment handle to its managed-region composition
///
/// A region is managed exactly when its backing segment appears here.
pub type ManagedRegistry = FxHashMap<SegmentId, ManagedRegionMap>;

/// The three independent region groups of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionGroup {
    /// The component's address space
    AddressSpace,
    /// The stack area, backed by its own reserved dataspace
    StackArea,
    /// The linker area, backed by its own reserved dataspace
    LinkerArea,
}

/// Target-side mutable state
#[derive(Debug)]
pub struct SessionState {
    /// Threads of the target, in creation order
    pub threads: Vec<ThreadHandle>,
    /// Regions attached in the address space, in attach order
    pub address_space: Vec<AttachedRegion>,
    /// Regions attached in the stack area, in attach order
    pub stack_area: Vec<AttachedRegion>,
    /// Regions attached in the linker area, in attach order
    pub linker_area: Vec<AttachedRegion>,
    /// Managed-region registry (backing handle -> subsegment map)
    pub managed: ManagedRegistry,
    /// Reserved backing handle of the stack-area dataspace
    pub stack_handle: SegmentId,
    /// Reserved backing handle of the linker-area dataspace
    pub linker_handle: SegmentId,
}

impl SessionState {
    /// The attachment list of one region group
    pub fn group(&self, group: RegionGroup) -> &Vec<AttachedRegion> {
        match group {
            RegionGroup::AddressSpace => &self.address_space,
            RegionGroup::StackArea => &self.stack_area,
            RegionGroup::LinkerArea => &self.linker_area,
        }
    }

    fn group_mut(&mut self, group: RegionGroup) -> &mut Vec<AttachedRegion> {
        match group {
            RegionGroup::AddressSpace => &mut self.address_space,
            RegionGroup::StackArea => &mut self.stack_area,
            RegionGroup::LinkerArea => &mut self.linker_area,
        }
    }
}

/// Session handle shared between the target side and the coordinator
pub struct TargetSession {
    state: Mutex<SessionState>,
}

impl TargetSession {
    /// Create a session with the two reserved backing handles
    pub fn new(stack_handle: SegmentId, linker_handle: SegmentId) -> Self {
        TargetSession {
            state: Mutex::new(SessionState {
                threads: Vec::new(),
                address_space: Vec::new(),
                stack_area: Vec::new(),
                linker_area: Vec::new(),
                managed: ManagedRegistry::default(),
                stack_handle,
                linker_handle,
            }),
        }
    }

    /// Lock the session state
    ///
    /// The coordinator holds this for a whole checkpoint pass.
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock()
    }

    /// Record a new thread of the target
    pub fn add_thread(&self, thread: ThreadHandle) {
        self.state.lock().threads.push(thread);
    }

    /// Attach a region into one region group
    pub fn attach(&self, group: RegionGroup, region: AttachedRegion) {
        self.state.lock().group_mut(group).push(region);
    }

    /// Attach a region into the address space
    pub fn attach_address_space(&self, region: AttachedRegion) {
        self.attach(RegionGroup::AddressSpace, region);
    }

    /// Detach the region with the given identity key from a group
    ///
    /// Returns false if no such region is attached.
    pub fn detach(&self, group: RegionGroup, key: RegionKey) -> bool {
        let mut state = self.state.lock();
        let list = state.group_mut(group);
        match list.iter().position(|r| r.key() == key) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Register the subsegment composition of a managed region
    pub fn register_managed(&self, segment: SegmentId, map: ManagedRegionMap) {
        self.state.lock().managed.insert(segment, map);
    }

    /// Re-mark one subsegment of a managed region as holding unsynced content
    ///
    /// Stands in for the external mutation tracker that flags a subsegment
    /// whenever its content changes. Returns false if the region is not
    /// managed or the index is out of range.
    pub fn mark_subsegment_attached(&self, segment: SegmentId, index: usize) -> bool {
        let mut state = self.state.lock();
        match state
            .managed
            .get_mut(&segment)
            .and_then(|map| map.subsegments.get_mut(index))
        {
            Some(sub) => {
                sub.attached = true;
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for TargetSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TargetSession")
            .field("threads", &state.threads.len())
            .field("address_space", &state.address_space.len())
            .field("stack_area", &state.stack_area.len())
            .field("linker_area", &state.linker_area.len())
            .field("managed", &state.managed.len())
            .finish()
    }
}
