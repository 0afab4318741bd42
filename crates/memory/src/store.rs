//! SegmentStore: allocation, release, and scoped mapping of backing segments
//!
//! The store keeps a side table from `SegmentId` to the backing buffer.
//! Mapping a segment is a scoped operation: `with_bytes` / `with_bytes_mut`
//! expose the bytes for exactly the duration of the closure, and the mapping
//! is released on every exit path. `copy_bytes` maps source and destination
//! for one copy only, so no mapping ever outlives the copy of one region.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use memsnap_core::{Error, Result, SegmentId};

type SegmentBuf = Arc<RwLock<Vec<u8>>>;

struct StoreInner {
    segments: FxHashMap<SegmentId, SegmentBuf>,
    next_id: u64,
    in_use: usize,
    quota: Option<usize>,
}

/// Allocator and scoped mapper for backing memory segments
///
/// Freshly allocated segments are zero-filled, so copy destinations read as
/// zero wherever no content has been copied yet.
pub struct SegmentStore {
    inner: Mutex<StoreInner>,
}

impl SegmentStore {
    /// Create a store without an allocation quota
    pub fn new() -> Self {
        Self::with_quota_opt(None)
    }

    /// Create a store that fails allocations beyond `quota` bytes in use
    pub fn with_quota(quota: usize) -> Self {
        Self::with_quota_opt(Some(quota))
    }

    fn with_quota_opt(quota: Option<usize>) -> Self {
        SegmentStore {
            inner: Mutex::new(StoreInner {
                segments: FxHashMap::default(),
                next_id: 1,
                in_use: 0,
                quota,
            }),
        }
    }

    /// Allocate a fresh zero-filled segment of `size` bytes
    ///
    /// # Errors
    /// Returns `Error::OutOfMemory` if the allocation would exceed the quota.
    pub fn alloc(&self, size: usize) -> Result<SegmentId> {
        let mut inner = self.inner.lock();
        if let Some(quota) = inner.quota {
            if inner.in_use + size > quota {
                return Err(Error::OutOfMemory {
                    requested: size,
                    in_use: inner.in_use,
                    quota,
                });
            }
        }
        let id = SegmentId::from_raw(inner.next_id);
        inner.next_id += 1;
        inner.in_use += size;
        inner
            .segments
            .insert(id, Arc::new(RwLock::new(vec![0u8; size])));
        Ok(id)
    }

    /// Release a segment
    ///
    /// # Errors
    /// Returns `Error::UnknownSegment` if the handle is dead (double free or
    /// dangling handle).
    pub fn free(&self, id: SegmentId) -> Result<()> {
        let mut inner = self.inner.lock();
        let buf = inner
            .segments
            .remove(&id)
            .ok_or(Error::UnknownSegment(id))?;
        inner.in_use -= buf.read().len();
        Ok(())
    }

    /// Whether the store currently knows this handle
    pub fn contains(&self, id: SegmentId) -> bool {
        self.inner.lock().segments.contains_key(&id)
    }

    /// Size of an allocated segment in bytes
    pub fn size_of(&self, id: SegmentId) -> Result<usize> {
        Ok(self.segment(id)?.read().len())
    }

    /// Total bytes currently allocated
    pub fn in_use(&self) -> usize {
        self.inner.lock().in_use
    }

    /// Number of live segments
    pub fn segment_count(&self) -> usize {
        self.inner.lock().segments.len()
    }

    fn segment(&self, id: SegmentId) -> Result<SegmentBuf> {
        self.inner
            .lock()
            .segments
            .get(&id)
            .cloned()
            .ok_or(Error::UnknownSegment(id))
    }

    /// Map a segment read-only for the duration of the closure
    ///
    /// The mapping is released when the closure returns, on every exit path.
    pub fn with_bytes<R>(&self, id: SegmentId, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let buf = self.segment(id)?;
        let guard = buf.read();
        Ok(f(&guard))
    }

    /// Map a segment writable for the duration of the closure
    pub fn with_bytes_mut<R>(&self, id: SegmentId, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        let buf = self.segment(id)?;
        let mut guard = buf.write();
        Ok(f(&mut guard))
    }

    /// Read a segment's full content
    pub fn read_bytes(&self, id: SegmentId) -> Result<Vec<u8>> {
        self.with_bytes(id, |bytes| bytes.to_vec())
    }

    /// Write bytes into a segment at `offset`
    ///
    /// Stands in for the target process mutating its own memory.
    pub fn write(&self, id: SegmentId, offset: usize, bytes: &[u8]) -> Result<()> {
        let buf = self.segment(id)?;
        let mut guard = buf.write();
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= guard.len())
            .ok_or(Error::CopyOutOfBounds {
                segment: id,
                segment_size: guard.len(),
                offset,
                len: bytes.len(),
            })?;
        guard[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy `len` bytes from the start of `src` into `dst` at `dst_offset`
    ///
    /// Both segments are mapped for the duration of this one copy and
    /// unmapped before returning, on every exit path.
    ///
    /// # Errors
    /// `Error::UnknownSegment` for a dead handle, `Error::CopyOutOfBounds`
    /// if the range does not fit either segment.
    pub fn copy_bytes(
        &self,
        src: SegmentId,
        dst: SegmentId,
        len: usize,
        dst_offset: usize,
    ) -> Result<()> {
        let src_buf = self.segment(src)?;
        let dst_buf = self.segment(dst)?;

        // Same-segment copies must not take the lock twice.
        if src == dst {
            let mut guard = src_buf.write();
            let size = guard.len();
            check_range(src, size, 0, len)?;
            check_range(dst, size, dst_offset, len)?;
            guard.copy_within(..len, dst_offset);
            return Ok(());
        }

        let src_map = src_buf.read();
        let mut dst_map = dst_buf.write();

        check_range(src, src_map.len(), 0, len)?;
        check_range(dst, dst_map.len(), dst_offset, len)?;

        dst_map[dst_offset..dst_offset + len].copy_from_slice(&src_map[..len]);
        Ok(())
    }
}

impl Default for SegmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SegmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SegmentStore")
            .field("segment_count", &inner.segments.len())
            .field("in_use", &inner.in_use)
            .field("quota", &inner.quota)
            .finish()
    }
}

fn check_range(segment: SegmentId, segment_size: usize, offset: usize, len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= segment_size => Ok(()),
        _ => Err(Error::CopyOutOfBounds {
            segment,
            segment_size,
            offset,
            len,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_is_zero_filled() {
        let store = SegmentStore::new();
        let id = store.alloc(64).unwrap();
        assert_eq!(store.read_bytes(id).unwrap(), vec![0u8; 64]);
        assert_eq!(store.size_of(id).unwrap(), 64);
    }

    #[test]
    fn test_free_releases_and_double_free_fails() {
        let store = SegmentStore::new();
        let id = store.alloc(16).unwrap();
        assert!(store.contains(id));
        assert_eq!(store.in_use(), 16);

        store.free(id).unwrap();
        assert!(!store.contains(id));
        assert_eq!(store.in_use(), 0);

        assert_eq!(store.free(id), Err(Error::UnknownSegment(id)));
    }

    #[test]
    fn test_handles_are_never_reused() {
        let store = SegmentStore::new();
        let a = store.alloc(8).unwrap();
        store.free(a).unwrap();
        let b = store.alloc(8).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_quota_exhaustion() {
        let store = SegmentStore::with_quota(100);
        let a = store.alloc(60).unwrap();

        let err = store.alloc(60).unwrap_err();
        assert_eq!(
            err,
            Error::OutOfMemory {
                requested: 60,
                in_use: 60,
                quota: 100,
            }
        );

        // Freeing makes room again.
        store.free(a).unwrap();
        store.alloc(60).unwrap();
    }

    #[test]
    fn test_write_and_scoped_read() {
        let store = SegmentStore::new();
        let id = store.alloc(8).unwrap();
        store.write(id, 2, &[1, 2, 3]).unwrap();

        let tail = store.with_bytes(id, |bytes| bytes[2..5].to_vec()).unwrap();
        assert_eq!(tail, vec![1, 2, 3]);
    }

    #[test]
    fn test_write_out_of_bounds() {
        let store = SegmentStore::new();
        let id = store.alloc(4).unwrap();
        let err = store.write(id, 2, &[0; 4]).unwrap_err();
        assert!(matches!(err, Error::CopyOutOfBounds { .. }));
    }

    #[test]
    fn test_copy_bytes_full() {
        let store = SegmentStore::new();
        let src = store.alloc(8).unwrap();
        let dst = store.alloc(8).unwrap();
        store.write(src, 0, &[9; 8]).unwrap();

        store.copy_bytes(src, dst, 8, 0).unwrap();
        assert_eq!(store.read_bytes(dst).unwrap(), vec![9u8; 8]);
    }

    #[test]
    fn test_copy_bytes_with_destination_offset() {
        let store = SegmentStore::new();
        let src = store.alloc(4).unwrap();
        let dst = store.alloc(8).unwrap();
        store.write(src, 0, &[7; 4]).unwrap();

        store.copy_bytes(src, dst, 4, 4).unwrap();
        let dst_bytes = store.read_bytes(dst).unwrap();
        assert_eq!(&dst_bytes[..4], &[0; 4]);
        assert_eq!(&dst_bytes[4..], &[7; 4]);
    }

    #[test]
    fn test_copy_bytes_bounds_checks() {
        let store = SegmentStore::new();
        let src = store.alloc(4).unwrap();
        let dst = store.alloc(4).unwrap();

        // Source too small.
        assert!(matches!(
            store.copy_bytes(src, dst, 8, 0),
            Err(Error::CopyOutOfBounds { .. })
        ));
        // Destination offset pushes the range past the end.
        assert!(matches!(
            store.copy_bytes(src, dst, 4, 2),
            Err(Error::CopyOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_copy_bytes_unknown_segment() {
        let store = SegmentStore::new();
        let src = store.alloc(4).unwrap();
        let dead = SegmentId::from_raw(99);
        assert_eq!(
            store.copy_bytes(src, dead, 4, 0),
            Err(Error::UnknownSegment(dead))
        );
    }

    #[test]
    fn test_copy_bytes_same_segment_is_noop() {
        let store = SegmentStore::new();
        let id = store.alloc(4).unwrap();
        store.write(id, 0, &[5; 4]).unwrap();
        store.copy_bytes(id, id, 4, 0).unwrap();
        assert_eq!(store.read_bytes(id).unwrap(), vec![5u8; 4]);
    }
}
