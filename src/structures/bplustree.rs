//! Disk-resident B+ tree over unique keys.
//!
//! Every node access goes through the buffer pool and each fetch is paired
//! with exactly one unpin; the dirty flag is reported on unpin iff the
//! node was mutated. Structural operations are mutually exclusive by
//! construction (`insert` takes `&mut self`); the per-frame latches are
//! the seam for finer crabbing later.

use crate::{
    common::{EngineError, EngineResult, MIN_NODE_FANOUT},
    io::{frames::Frame, pool::BufferPoolManager},
    storage::{
        header::{HeaderMut, HeaderRef},
        node::{NodeMut, NodeRef, KEY_SIZE, MAX_NODE_FANOUT},
    },
    structures::comparator::Comparator,
    types::{PageId, Rid, HEADER_PAGE_ID, INVALID_PAGE_ID},
};

use std::sync::Arc;

use tracing::debug;

/// Root tracking mode for the header page record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootRecord {
    /// First creation of the index.
    Insert,
    /// Root changed afterwards.
    Update,
}

/// One index per tree instance; the name keys the header page record.
pub struct BPlusTree<C: Comparator> {
    index_name: String,
    root_page_id: PageId,
    pool: Arc<BufferPoolManager>,
    comparator: C,
    leaf_max_size: usize,
    internal_max_size: usize,
}

impl<C: Comparator> BPlusTree<C> {
    pub fn new(
        index_name: impl Into<String>,
        pool: Arc<BufferPoolManager>,
        comparator: C,
        leaf_max_size: usize,
        internal_max_size: usize,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            root_page_id: INVALID_PAGE_ID,
            pool,
            comparator,
            leaf_max_size: leaf_max_size.clamp(MIN_NODE_FANOUT, MAX_NODE_FANOUT),
            internal_max_size: internal_max_size.clamp(MIN_NODE_FANOUT, MAX_NODE_FANOUT),
        }
    }

    /// Resumes an index whose root is recorded in the header page.
    pub fn open(
        index_name: impl Into<String>,
        pool: Arc<BufferPoolManager>,
        comparator: C,
        leaf_max_size: usize,
        internal_max_size: usize,
    ) -> EngineResult<Self> {
        let index_name = index_name.into();
        let header = Self::fetch_from(&pool, HEADER_PAGE_ID)?;
        let root = {
            let page = header.read();
            HeaderRef::new(page.data()).get_record(&index_name)?
        };
        pool.unpin_page(HEADER_PAGE_ID, false);

        let root_page_id = root.ok_or_else(|| EngineError::IndexNotFound(index_name.clone()))?;
        let mut tree = Self::new(index_name, pool, comparator, leaf_max_size, internal_max_size);
        tree.root_page_id = root_page_id;
        Ok(tree)
    }

    pub fn name(&self) -> &str {
        &self.index_name
    }

    pub fn is_empty(&self) -> bool {
        self.root_page_id == INVALID_PAGE_ID
    }

    pub fn root_page_id(&self) -> PageId {
        self.root_page_id
    }

    fn fetch_from(pool: &BufferPoolManager, page_id: PageId) -> EngineResult<Frame> {
        pool.fetch_page(page_id)?.ok_or(EngineError::PoolExhausted)
    }

    fn fetch(&self, page_id: PageId) -> EngineResult<Frame> {
        Self::fetch_from(&self.pool, page_id)
    }

    fn alloc(&self) -> EngineResult<(PageId, Frame)> {
        self.pool.new_page()?.ok_or(EngineError::PoolExhausted)
    }

    /// Point lookup. Returns the value stored under the key, if any.
    pub fn get_value(&self, key: &[u8]) -> EngineResult<Option<Rid>> {
        if self.is_empty() {
            return Ok(None);
        }

        let (leaf_id, leaf) = self.find_leaf(key)?;
        let result = {
            let page = leaf.read();
            NodeRef::new(page.data()).leaf_lookup(&self.comparator, key)?
        };
        self.pool.unpin_page(leaf_id, false);
        Ok(result)
    }

    /// Inserts a unique key. Returns false (and leaves the tree untouched)
    /// when the key is already present.
    pub fn insert(&mut self, key: &[u8], value: Rid) -> EngineResult<bool> {
        if key.is_empty() || key.len() > KEY_SIZE {
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Keys must be 1..={} bytes, got {}", KEY_SIZE, key.len()),
            )));
        }

        if self.is_empty() {
            self.start_new_tree(key, value)?;
            return Ok(true);
        }
        self.insert_into_leaf(key, value)
    }

    /// Descends from the root to the leaf responsible for the key,
    /// unpinning each ancestor once its child is fetched. The returned
    /// leaf stays pinned.
    fn find_leaf(&self, key: &[u8]) -> EngineResult<(PageId, Frame)> {
        debug_assert!(!self.is_empty());

        let mut page_id = self.root_page_id;
        let mut frame = self.fetch(page_id)?;

        loop {
            let child_id = {
                let page = frame.read();
                let node = NodeRef::new(page.data());
                if node.is_leaf()? {
                    None
                } else {
                    Some(node.internal_lookup(&self.comparator, key)?)
                }
            };

            match child_id {
                None => return Ok((page_id, frame)),
                Some(child_id) => {
                    let child = self.fetch(child_id)?;
                    self.pool.unpin_page(page_id, false);
                    page_id = child_id;
                    frame = child;
                }
            }
        }
    }

    /// Allocates the first leaf, makes it the root and records the index
    /// in the header page.
    fn start_new_tree(&mut self, key: &[u8], value: Rid) -> EngineResult<()> {
        let (root_id, root) = self.alloc()?;
        {
            let mut page = root.write();
            let mut node = NodeMut::new(page.data_mut());
            node.init_leaf(root_id, INVALID_PAGE_ID, self.leaf_max_size);
            node.leaf_insert(&self.comparator, key, value)?;
        }
        self.root_page_id = root_id;
        self.update_root_record(RootRecord::Insert)?;
        self.pool.unpin_page(root_id, true);
        debug!(index = %self.index_name, root_id, "started new tree");
        Ok(())
    }

    fn insert_into_leaf(&mut self, key: &[u8], value: Rid) -> EngineResult<bool> {
        let (leaf_id, leaf) = self.find_leaf(key)?;

        let (old_size, new_size) = {
            let mut page = leaf.write();
            let mut node = NodeMut::new(page.data_mut());
            let old_size = node.as_ref().size();
            let new_size = node.leaf_insert(&self.comparator, key, value)?;
            (old_size, new_size)
        };

        // Duplicate key: nothing was written.
        if new_size == old_size {
            self.pool.unpin_page(leaf_id, false);
            return Ok(false);
        }

        if new_size < self.leaf_max_size {
            self.pool.unpin_page(leaf_id, true);
            return Ok(true);
        }

        // The leaf is full: move its upper half into a fresh sibling and
        // push the sibling's first key up.
        let (new_leaf_id, new_leaf) = self.alloc()?;
        let separator = {
            let mut old_page = leaf.write();
            let mut new_page = new_leaf.write();
            let parent_id = NodeRef::new(old_page.data()).header().parent_page_id;

            let mut old_node = NodeMut::new(old_page.data_mut());
            let mut new_node = NodeMut::new(new_page.data_mut());
            new_node.init_leaf(new_leaf_id, parent_id, self.leaf_max_size);
            old_node.leaf_move_upper_half_to(&mut new_node);

            let mut separator = [0u8; KEY_SIZE];
            separator.copy_from_slice(new_node.as_ref().key_at(0));
            separator
        };
        debug!(index = %self.index_name, leaf_id, new_leaf_id, "split leaf");

        self.insert_into_parent(leaf_id, &leaf, &separator, new_leaf_id)?;
        self.pool.unpin_page(leaf_id, true);
        self.pool.unpin_page(new_leaf_id, true);
        Ok(true)
    }

    /// Propagates a split upward: links the new sibling under the old
    /// node's parent, growing a new root when the old node was the root.
    fn insert_into_parent(
        &mut self,
        old_id: PageId,
        old_frame: &Frame,
        separator: &[u8; KEY_SIZE],
        new_id: PageId,
    ) -> EngineResult<()> {
        if old_id == self.root_page_id {
            let (root_id, root) = self.alloc()?;
            {
                let mut page = root.write();
                let mut node = NodeMut::new(page.data_mut());
                node.init_internal(root_id, INVALID_PAGE_ID, self.internal_max_size);
                node.internal_populate_new_root(old_id, separator, new_id);
            }

            {
                let mut page = old_frame.write();
                NodeMut::new(page.data_mut()).set_parent_page_id(root_id);
            }
            let new_frame = self.fetch(new_id)?;
            {
                let mut page = new_frame.write();
                NodeMut::new(page.data_mut()).set_parent_page_id(root_id);
            }
            self.pool.unpin_page(new_id, true);

            self.root_page_id = root_id;
            self.update_root_record(RootRecord::Update)?;
            self.pool.unpin_page(root_id, true);
            debug!(index = %self.index_name, root_id, "grew new root");
            return Ok(());
        }

        let parent_id = {
            let page = old_frame.read();
            NodeRef::new(page.data()).header().parent_page_id
        };
        let parent = self.fetch(parent_id)?;

        let new_size = {
            let mut page = parent.write();
            NodeMut::new(page.data_mut()).internal_insert_after(old_id, separator, new_id)?
        };

        if new_size <= self.internal_max_size {
            self.pool.unpin_page(parent_id, true);
            return Ok(());
        }

        // The parent overflowed: split it and recurse.
        let (new_parent_id, new_parent) = self.alloc()?;
        let (parent_separator, moved_children) = {
            let mut old_page = parent.write();
            let mut new_page = new_parent.write();
            let grandparent_id = NodeRef::new(old_page.data()).header().parent_page_id;

            let mut old_node = NodeMut::new(old_page.data_mut());
            let mut new_node = NodeMut::new(new_page.data_mut());
            new_node.init_internal(new_parent_id, grandparent_id, self.internal_max_size);
            let moved = old_node.internal_move_upper_half_to(&mut new_node);

            let mut separator = [0u8; KEY_SIZE];
            separator.copy_from_slice(new_node.as_ref().key_at(0));
            (separator, moved)
        };
        debug!(index = %self.index_name, parent_id, new_parent_id, "split internal node");

        for child_id in moved_children {
            let child = self.fetch(child_id)?;
            {
                let mut page = child.write();
                NodeMut::new(page.data_mut()).set_parent_page_id(new_parent_id);
            }
            self.pool.unpin_page(child_id, true);
        }

        self.insert_into_parent(parent_id, &parent, &parent_separator, new_parent_id)?;
        self.pool.unpin_page(parent_id, true);
        self.pool.unpin_page(new_parent_id, true);
        Ok(())
    }

    /// Keeps the header page record in sync with the live root.
    fn update_root_record(&self, mode: RootRecord) -> EngineResult<()> {
        let header = self.fetch(HEADER_PAGE_ID)?;
        let ok = {
            let mut page = header.write();
            let mut view = HeaderMut::new(page.data_mut());
            match mode {
                RootRecord::Insert => view.insert_record(&self.index_name, self.root_page_id)?,
                RootRecord::Update => view.update_record(&self.index_name, self.root_page_id)?,
            }
        };
        self.pool.unpin_page(HEADER_PAGE_ID, true);

        if !ok {
            return Err(EngineError::HeaderRecord(format!(
                "{} of record '{}' rejected by header page",
                match mode {
                    RootRecord::Insert => "insert",
                    RootRecord::Update => "update",
                },
                self.index_name
            )));
        }
        Ok(())
    }
}
