use crate::{
    common::{ReplacerError, ReplacerResult},
    types::FrameId,
};

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::trace;

/// Book-keeping for one tracked frame.
#[derive(Debug, Default)]
struct ReplacerEntry {
    access_count: usize,
    evictable: bool,
}

#[derive(Debug, Default)]
struct ReplacerState {
    entries: HashMap<FrameId, ReplacerEntry>,
    /// Frames with fewer than K accesses, in order of first access.
    history: VecDeque<FrameId>,
    /// Frames with at least K accesses, most recently used at the back.
    cache: VecDeque<FrameId>,
    /// Number of evictable frames.
    current_size: usize,
}

/// LRU-K replacement policy.
///
/// Among evictable frames, the victim is the one with the largest backward
/// K-distance, the time since its K-th most recent access. Frames with
/// fewer than K accesses have infinite distance and are preferred, oldest
/// first access first. Ties among frames with full history fall back to
/// plain LRU on the K-th access.
pub struct LruKReplacer {
    replacer_size: usize,
    k: usize,
    state: Mutex<ReplacerState>,
}

fn unlink(queue: &mut VecDeque<FrameId>, frame_id: FrameId) {
    if let Some(pos) = queue.iter().position(|&f| f == frame_id) {
        queue.remove(pos);
    }
}

impl LruKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        Self {
            replacer_size: num_frames,
            k: k.max(1),
            state: Mutex::new(ReplacerState::default()),
        }
    }

    /// Capacity, in frames.
    pub fn capacity(&self) -> usize {
        self.replacer_size
    }

    /// Records an access to the frame, promoting it between the history
    /// and cache queues as its count crosses K.
    ///
    /// A frame seen for the first time starts out non-evictable; the
    /// evictable count only moves through [`LruKReplacer::set_evictable`].
    pub fn record_access(&self, frame_id: FrameId) {
        debug_assert!(
            (frame_id as usize) < self.replacer_size,
            "frame id {} out of range",
            frame_id
        );

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let entry = state.entries.entry(frame_id).or_default();
        entry.access_count += 1;
        let count = entry.access_count;

        if count == 1 {
            if self.k == 1 {
                state.cache.push_back(frame_id);
            } else {
                state.history.push_back(frame_id);
            }
        } else if count == self.k {
            unlink(&mut state.history, frame_id);
            state.cache.push_back(frame_id);
        } else if count > self.k {
            unlink(&mut state.cache, frame_id);
            state.cache.push_back(frame_id);
        }
    }

    /// Flags the frame as a legal eviction candidate, or withdraws it.
    /// Unknown frames are ignored.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(entry) = state.entries.get_mut(&frame_id) else {
            return;
        };

        if entry.evictable && !evictable {
            entry.evictable = false;
            state.current_size -= 1;
        } else if !entry.evictable && evictable {
            entry.evictable = true;
            state.current_size += 1;
        }
    }

    /// Evicts the evictable frame with the largest backward K-distance and
    /// forgets its access history.
    pub fn evict(&self) -> Option<FrameId> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let found = |queue: &VecDeque<FrameId>, entries: &HashMap<FrameId, ReplacerEntry>| {
            queue
                .iter()
                .position(|f| entries.get(f).is_some_and(|e| e.evictable))
        };

        let victim = if let Some(pos) = found(&state.history, &state.entries) {
            state.history.remove(pos)
        } else if let Some(pos) = found(&state.cache, &state.entries) {
            state.cache.remove(pos)
        } else {
            None
        }?;

        state.entries.remove(&victim);
        state.current_size -= 1;
        trace!(frame_id = victim, "evicted frame");
        Some(victim)
    }

    /// Drops the frame from the replacer entirely.
    ///
    /// Only evictable frames may be removed; asking for a pinned frame is
    /// a programmer error. Unknown frames are a no-op.
    pub fn remove(&self, frame_id: FrameId) -> ReplacerResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(entry) = state.entries.get(&frame_id) else {
            return Ok(());
        };

        if !entry.evictable {
            return Err(ReplacerError::NotEvictable(frame_id));
        }

        if entry.access_count < self.k {
            unlink(&mut state.history, frame_id);
        } else {
            unlink(&mut state.cache, frame_id);
        }
        state.entries.remove(&frame_id);
        state.current_size -= 1;
        Ok(())
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.state.lock().current_size
    }
}
