//! Concurrent extendible hash table.
//!
//! Serves as the page-id to frame-id lookup directory of the buffer pool.
//! The directory doubles when a full bucket sits at the global depth;
//! buckets are shared between directory slots through [`Arc`] handles, so
//! a split only rewrites the slots whose low bits match the split bucket.

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash, Hasher},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};

/// Bounded key/value list with a residency depth.
#[derive(Debug)]
struct Bucket<K, V> {
    capacity: usize,
    depth: usize,
    items: Vec<(K, V)>,
}

impl<K: Eq, V: Clone> Bucket<K, V> {
    fn new(capacity: usize, depth: usize) -> Self {
        Self {
            capacity,
            depth,
            items: Vec::with_capacity(capacity),
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    fn find(&self, key: &K) -> Option<V> {
        self.items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn remove(&mut self, key: &K) -> bool {
        let before = self.items.len();
        self.items.retain(|(k, _)| k != key);
        self.items.len() < before
    }

    /// Overwrites an existing key, appends when there is room, and
    /// otherwise reports the bucket full.
    fn insert(&mut self, key: K, value: V) -> bool {
        if let Some((_, v)) = self.items.iter_mut().find(|(k, _)| *k == key) {
            *v = value;
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.items.push((key, value));
        true
    }
}

type BucketRef<K, V> = Arc<RwLock<Bucket<K, V>>>;

#[derive(Debug)]
struct Directory<K, V> {
    global_depth: usize,
    dir: Vec<BucketRef<K, V>>,
    num_buckets: usize,
}

/// Extendible hash table with directory doubling.
///
/// The hasher is a type parameter the way std collections do it, so tests
/// can pin a deterministic hash while production code keeps the default.
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    bucket_size: usize,
    hasher: S,
    state: Mutex<Directory<K, V>>,
}

impl<K, V> ExtendibleHashTable<K, V, RandomState>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    pub fn with_hasher(bucket_size: usize, hasher: S) -> Self {
        let bucket_size = bucket_size.max(1);
        let dir = vec![Arc::new(RwLock::new(Bucket::new(bucket_size, 0)))];
        Self {
            bucket_size,
            hasher,
            state: Mutex::new(Directory {
                global_depth: 0,
                dir,
                num_buckets: 1,
            }),
        }
    }

    fn hash_of(&self, key: &K) -> u64 {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn index_of(hash: u64, global_depth: usize) -> usize {
        (hash & ((1u64 << global_depth) - 1)) as usize
    }

    pub fn global_depth(&self) -> usize {
        self.state.lock().global_depth
    }

    pub fn local_depth(&self, dir_index: usize) -> usize {
        self.state.lock().dir[dir_index].read().depth
    }

    pub fn num_buckets(&self) -> usize {
        self.state.lock().num_buckets
    }

    pub fn find(&self, key: &K) -> Option<V> {
        let hash = self.hash_of(key);
        let state = self.state.lock();
        let bucket = Arc::clone(&state.dir[Self::index_of(hash, state.global_depth)]);
        let found = bucket.read().find(key);
        found
    }

    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash_of(key);
        let state = self.state.lock();
        let bucket = Arc::clone(&state.dir[Self::index_of(hash, state.global_depth)]);
        let removed = bucket.write().remove(key);
        removed
    }

    /// Inserts the pair, overwriting the value when the key is present.
    ///
    /// A full target bucket splits, doubling the directory first when the
    /// bucket already sits at the global depth; the insertion retries
    /// because a split can leave every item on one side.
    pub fn insert(&self, key: K, value: V) {
        let hash = self.hash_of(&key);
        let mut guard = self.state.lock();
        let state = &mut *guard;

        loop {
            let index = Self::index_of(hash, state.global_depth);
            let bucket = Arc::clone(&state.dir[index]);
            let mut locked = bucket.write();

            if locked.insert(key.clone(), value.clone()) {
                return;
            }

            // Split. Bring the directory up to the new local depth first.
            let local_depth = locked.depth;
            if local_depth == state.global_depth {
                state.dir.extend_from_within(..);
                state.global_depth += 1;
            }

            let bucket0 = Arc::new(RwLock::new(Bucket::new(self.bucket_size, local_depth + 1)));
            let bucket1 = Arc::new(RwLock::new(Bucket::new(self.bucket_size, local_depth + 1)));

            // The new high bit decides which side each item lands on.
            let local_mask = 1u64 << local_depth;
            let items = std::mem::take(&mut locked.items);
            drop(locked);
            for (k, v) in items {
                let side = if self.hash_of(&k) & local_mask != 0 {
                    &bucket1
                } else {
                    &bucket0
                };
                side.write().items.push((k, v));
            }

            // Rewrite every slot that aliased the split bucket.
            for (i, slot) in state.dir.iter_mut().enumerate() {
                if Arc::ptr_eq(slot, &bucket) {
                    *slot = if i as u64 & local_mask != 0 {
                        Arc::clone(&bucket1)
                    } else {
                        Arc::clone(&bucket0)
                    };
                }
            }
            state.num_buckets += 1;
        }
    }
}
