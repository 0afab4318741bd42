//! Error types for the memsnap engine
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. Only resource exhaustion fails a checkpoint outright;
//! consistency problems during the copy phase are reported as diagnostics
//! and counted, not raised.

use crate::types::SegmentId;
use thiserror::Error;

/// Result type alias for memsnap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the memsnap engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Allocation failure from the memory store
    ///
    /// The hard-failure path of a checkpoint call. Segments already
    /// allocated earlier in the failing pass are not rolled back.
    #[error("out of memory: requested {requested} bytes with {in_use} of {quota} in use")]
    OutOfMemory {
        /// Bytes requested by the failing allocation
        requested: usize,
        /// Bytes in use at the time of the request
        in_use: usize,
        /// Configured allocation quota
        quota: usize,
    },

    /// Operation on a segment handle the store does not know
    ///
    /// Indicates a dangling or double-freed handle.
    #[error("unknown segment: {0}")]
    UnknownSegment(SegmentId),

    /// A copy range does not fit inside the addressed segment
    #[error(
        "copy out of bounds: {len} bytes at offset {offset} into {segment} of {segment_size} bytes"
    )]
    CopyOutOfBounds {
        /// Segment whose bounds were exceeded
        segment: SegmentId,
        /// Size of that segment
        segment_size: usize,
        /// Offset at which the access started
        offset: usize,
        /// Length of the access
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_out_of_memory() {
        let err = Error::OutOfMemory {
            requested: 8192,
            in_use: 4096,
            quota: 10240,
        };
        let msg = err.to_string();
        assert!(msg.contains("out of memory"));
        assert!(msg.contains("8192"));
        assert!(msg.contains("10240"));
    }

    #[test]
    fn test_error_display_unknown_segment() {
        let err = Error::UnknownSegment(SegmentId::from_raw(11));
        assert!(err.to_string().contains("seg:11"));
    }

    #[test]
    fn test_error_display_copy_out_of_bounds() {
        let err = Error::CopyOutOfBounds {
            segment: SegmentId::from_raw(2),
            segment_size: 4096,
            offset: 4000,
            len: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("copy out of bounds"));
        assert!(msg.contains("seg:2"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_result().unwrap(), 42);
    }
}
