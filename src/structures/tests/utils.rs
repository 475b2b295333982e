use crate::{
    common::EngineConfig,
    io::{disk::DiskManager, pool::BufferPoolManager},
    storage::node::KEY_SIZE,
    structures::{bplustree::BPlusTree, comparator::SignedNumericComparator},
    types::Rid,
};

use std::sync::Arc;

use tempfile::TempDir;

pub(crate) fn test_pool(pool_size: usize) -> (Arc<BufferPoolManager>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let disk = DiskManager::create(dir.path().join("test.db")).expect("Failed to create db file");
    let config = EngineConfig::new(pool_size, 2, 4, 8, 8);
    (Arc::new(BufferPoolManager::new(&config, disk)), dir)
}

pub(crate) fn test_tree(
    pool_size: usize,
    leaf_max_size: usize,
    internal_max_size: usize,
) -> (BPlusTree<SignedNumericComparator>, Arc<BufferPoolManager>, TempDir) {
    let (pool, dir) = test_pool(pool_size);
    let tree = BPlusTree::new(
        "test_index",
        Arc::clone(&pool),
        SignedNumericComparator::with_type::<i64>(),
        leaf_max_size,
        internal_max_size,
    );
    (tree, pool, dir)
}

pub(crate) fn key(value: i64) -> [u8; KEY_SIZE] {
    value.to_ne_bytes()
}

pub(crate) fn rid(value: i64) -> Rid {
    Rid::new(value as i32, 0)
}
