//! Memory segment store for the memsnap engine
//!
//! `SegmentStore` plays the role of the external memory-management
//! collaborator: it allocates and frees raw backing segments and exposes a
//! segment's bytes for the duration of one scoped operation. The checkpoint
//! engine owns no raw memory itself; every byte it touches goes through this
//! store.

mod store;

pub use store::SegmentStore;
