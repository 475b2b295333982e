//! VesperDB storage engine core.
//!
//! A fixed-size buffer pool mediates all access between on-disk pages and
//! in-memory frames. A concurrent extendible hash table serves as the
//! page-id to frame lookup directory and an LRU-K policy picks eviction
//! victims. On top of the pool sits a disk-resident B+ tree supporting
//! point lookups and unique-key insertion with split propagation.

pub mod common;
pub mod io;
mod macros;
pub mod storage;
pub mod structures;
pub mod types;

pub use common::*;
pub use types::*;

pub use io::disk::DiskManager;
pub use io::frames::Frame;
pub use io::pool::{BufferPoolManager, PoolStats};
pub use io::replacer::LruKReplacer;
pub use structures::bplustree::BPlusTree;
pub use structures::comparator::{
    Comparator, FixedSizeBytesComparator, NumericComparator, SignedNumericComparator,
};
pub use structures::hashing::ExtendibleHashTable;

/// Jemalloc has stronger alignment guarantees than the system allocator,
/// which matters for the page buffers handed to the disk layer.
#[cfg(not(miri))]
use jemallocator::Jemalloc;

#[cfg(not(miri))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;
