//! Thread snapshotter: shallow duplication of thread identities
//!
//! Append-only by contract: there is no deletion pass and no
//! deduplication. The coordinator clears the copied list at the start of
//! each checkpoint pass; calling this repeatedly on the same list outside
//! that discipline accumulates duplicates.

use memsnap_core::{CopiedThreadHandle, ThreadHandle};

/// Append one shallow copy per thread handle, in list order
pub fn snapshot_into(threads: &[ThreadHandle], copies: &mut Vec<CopiedThreadHandle>) {
    for &thread in threads {
        copies.push(CopiedThreadHandle::new(thread));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_preserves_order() {
        let threads: Vec<ThreadHandle> = (0..4).map(ThreadHandle::from_raw).collect();
        let mut copies = Vec::new();

        snapshot_into(&threads, &mut copies);

        assert_eq!(copies.len(), 4);
        for (i, copy) in copies.iter().enumerate() {
            assert_eq!(copy.thread, ThreadHandle::from_raw(i as u64));
        }
    }

    #[test]
    fn test_snapshot_appends_without_reconciling() {
        let threads = vec![ThreadHandle::from_raw(1)];
        let mut copies = Vec::new();

        snapshot_into(&threads, &mut copies);
        snapshot_into(&threads, &mut copies);

        // Append-only: duplicates are the documented behavior.
        assert_eq!(copies.len(), 2);
    }

    #[test]
    fn test_snapshot_empty_list() {
        let mut copies = Vec::new();
        snapshot_into(&[], &mut copies);
        assert!(copies.is_empty());
    }
}
