//! Smoke test for the public facade API

use std::sync::Arc;

use memsnap::{
    AttachedRegion, CapabilitySnapshot, CheckpointCoordinator, RegionGroup, RegionKey,
    SegmentStore, TargetSession, ThreadHandle,
};

#[test]
fn checkpoint_through_facade() {
    let store = Arc::new(SegmentStore::new());
    let stack = store.alloc(4096).unwrap();
    let linker = store.alloc(4096).unwrap();
    let session = Arc::new(TargetSession::new(stack, linker));

    session.add_thread(ThreadHandle::from_raw(1));
    let seg = store.alloc(4096).unwrap();
    store.write(seg, 0, b"checkpoint me").unwrap();
    session.attach_address_space(AttachedRegion::new(seg, 0x1000, 4096));

    let coordinator = CheckpointCoordinator::new(store.clone(), session.clone());
    let checkpoint = coordinator.checkpoint().unwrap();

    assert_eq!(checkpoint.sequence, 1);
    assert_eq!(checkpoint.threads.len(), 1);
    assert_eq!(checkpoint.capabilities, CapabilitySnapshot::Unimplemented);
    assert_eq!(checkpoint.address_space.len(), 1);

    let copy = checkpoint.address_space[0];
    let bytes = store.read_bytes(copy.copy_segment).unwrap();
    assert_eq!(&bytes[..13], b"checkpoint me");

    session.detach(RegionGroup::AddressSpace, RegionKey::new(seg, 0x1000));
    let checkpoint = coordinator.checkpoint().unwrap();
    assert!(checkpoint.address_space.is_empty());
}
