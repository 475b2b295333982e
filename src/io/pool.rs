use crate::{
    common::EngineConfig,
    io::{disk::DiskManager, frames::Frame, replacer::LruKReplacer},
    structures::hashing::ExtendibleHashTable,
    types::{FrameId, PageId, INVALID_PAGE_ID},
};

use std::{
    collections::VecDeque,
    io::{self, Error as IoError},
};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct PoolStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub pages_evicted: u64,
    pub pages_written: u64,
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, " Cache hits: {}", self.cache_hits)?;
        writeln!(f, " Cache misses: {}", self.cache_misses)?;
        writeln!(f, " Pages evicted: {}", self.pages_evicted)?;
        writeln!(f, " Pages written: {}", self.pages_written)?;
        Ok(())
    }
}

#[derive(Debug)]
struct PoolState {
    free_list: VecDeque<FrameId>,
    next_page_id: PageId,
    stats: PoolStats,
}

/// Fixed-size buffer pool mediating all access between on-disk pages and
/// in-memory frames.
///
/// The pool latch is the outermost lock and is held for the full duration
/// of every public operation; the directory and replacer latches nest
/// underneath it. Disk I/O happens under the latch only where it is
/// inherent to fetching or evicting, which is safe because the page being
/// transferred is referenced by nobody else at that point.
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<Frame>,
    page_table: ExtendibleHashTable<PageId, FrameId>,
    replacer: LruKReplacer,
    disk: Mutex<DiskManager>,
    state: Mutex<PoolState>,
}

impl BufferPoolManager {
    /// Page 0 is reserved for the header page, so allocation starts at 1.
    pub fn new(config: &EngineConfig, disk: DiskManager) -> Self {
        let pool_size = config.pool_size.max(1);
        let frames = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list = (0..pool_size as FrameId).collect();

        Self {
            pool_size,
            frames,
            page_table: ExtendibleHashTable::new(config.bucket_size),
            replacer: LruKReplacer::new(pool_size, config.replacer_k),
            disk: Mutex::new(disk),
            state: Mutex::new(PoolState {
                free_list,
                next_page_id: 1,
                stats: PoolStats::default(),
            }),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn stats(&self) -> PoolStats {
        self.state.lock().stats
    }

    fn frame(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id as usize]
    }

    /// Claims a frame for reuse: free list first, then the replacer. The
    /// victim's previous page is written back when dirty and unlinked from
    /// the directory. Returns None when every frame is pinned.
    fn acquire_victim(&self, state: &mut PoolState) -> io::Result<Option<FrameId>> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(Some(frame_id));
        }

        let Some(frame_id) = self.replacer.evict() else {
            return Ok(None);
        };
        state.stats.pages_evicted += 1;

        let frame = self.frame(frame_id);
        let old_page_id;
        {
            let mut page = frame.write();
            old_page_id = page.id();
            if frame.is_dirty() {
                self.disk.lock().write_page(old_page_id, page.data())?;
                frame.clear_dirty();
                state.stats.pages_written += 1;
            }
            page.reset();
        }

        if old_page_id != INVALID_PAGE_ID {
            self.page_table.remove(&old_page_id);
        }
        trace!(frame_id, old_page_id, "reclaimed frame");
        Ok(Some(frame_id))
    }

    /// Registers a freshly filled frame: pinned once, tracked by the
    /// replacer, non-evictable until the first unpin.
    fn register_frame(&self, page_id: PageId, frame_id: FrameId) {
        let frame = self.frame(frame_id);
        frame.reset_pins();
        frame.pin();
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);
        self.page_table.insert(page_id, frame_id);
    }

    /// Allocates a brand new page pinned into a frame.
    ///
    /// Returns None when the pool is exhausted, in which case no page id
    /// is consumed.
    pub fn new_page(&self) -> io::Result<Option<(PageId, Frame)>> {
        let mut state = self.state.lock();

        let Some(frame_id) = self.acquire_victim(&mut state)? else {
            debug!("new_page failed: every frame is pinned");
            return Ok(None);
        };

        let page_id = state.next_page_id;
        state.next_page_id += 1;

        let frame = self.frame(frame_id);
        {
            let mut page = frame.write();
            page.reset();
            page.set_id(page_id);
        }
        frame.clear_dirty();
        self.register_frame(page_id, frame_id);

        Ok(Some((page_id, frame.clone())))
    }

    /// Returns the frame holding the page, reading it from disk when it is
    /// not resident. None when the pool is exhausted.
    pub fn fetch_page(&self, page_id: PageId) -> io::Result<Option<Frame>> {
        if page_id < 0 {
            return Err(IoError::new(
                io::ErrorKind::InvalidInput,
                format!("Cannot fetch invalid page id {}", page_id),
            ));
        }

        let mut state = self.state.lock();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            state.stats.cache_hits += 1;
            let frame = self.frame(frame_id);
            frame.pin();
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            return Ok(Some(frame.clone()));
        }
        state.stats.cache_misses += 1;

        let Some(frame_id) = self.acquire_victim(&mut state)? else {
            debug!(page_id, "fetch_page failed: every frame is pinned");
            return Ok(None);
        };

        let frame = self.frame(frame_id);
        let read_result = {
            let mut page = frame.write();
            page.set_id(page_id);
            self.disk.lock().read_page(page_id, page.data_mut())
        };
        if let Err(e) = read_result {
            frame.write().reset();
            state.free_list.push_back(frame_id);
            return Err(e);
        }
        frame.clear_dirty();
        self.register_frame(page_id, frame_id);

        Ok(Some(frame.clone()))
    }

    /// Drops one pin on the page, OR-ing the dirty flag in. The frame
    /// becomes evictable when the pin count reaches zero.
    ///
    /// Returns false when the page is not resident or was not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _state = self.state.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = self.frame(frame_id);
        if frame.pin_count() <= 0 {
            warn!(page_id, "unpin of a page that is not pinned");
            return false;
        }

        frame.or_dirty(is_dirty);
        if frame.unpin() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes the page out and clears its dirty flag, pinning untouched.
    /// Returns false when the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> io::Result<bool> {
        let mut state = self.state.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(false);
        };
        let frame = self.frame(frame_id);
        let page = frame.read();
        self.disk.lock().write_page(page_id, page.data())?;
        frame.clear_dirty();
        state.stats.pages_written += 1;
        Ok(true)
    }

    /// Writes out every resident page.
    pub fn flush_all_pages(&self) -> io::Result<()> {
        let mut state = self.state.lock();

        for frame in &self.frames {
            let page = frame.read();
            if page.id() != INVALID_PAGE_ID {
                self.disk.lock().write_page(page.id(), page.data())?;
                frame.clear_dirty();
                state.stats.pages_written += 1;
            }
        }
        Ok(())
    }

    /// Removes the page from the pool and releases its on-disk id.
    ///
    /// A page that is not resident succeeds trivially; a pinned page
    /// cannot be deleted.
    pub fn delete_page(&self, page_id: PageId) -> io::Result<bool> {
        let mut state = self.state.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            self.disk.lock().deallocate_page(page_id);
            return Ok(true);
        };

        let frame = self.frame(frame_id);
        if frame.pin_count() > 0 {
            return Ok(false);
        }

        {
            let mut page = frame.write();
            if frame.is_dirty() {
                self.disk.lock().write_page(page_id, page.data())?;
                frame.clear_dirty();
                state.stats.pages_written += 1;
            }
            page.reset();
        }

        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id).map_err(IoError::from)?;
        state.free_list.push_back(frame_id);
        self.disk.lock().deallocate_page(page_id);
        debug!(page_id, frame_id, "deleted page");
        Ok(true)
    }
}
