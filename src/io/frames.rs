use crate::storage::page::Page;

use std::sync::{
    atomic::{AtomicBool, AtomicI32, Ordering},
    Arc,
};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to one buffer pool frame.
///
/// Better [`RwLock`] than [`Mutex`] here, as we want to allow multiple
/// readers on the page but a single writer at a time. Pin count and dirty
/// flag are atomics so the pool can toggle them without the page latch;
/// both are only ever mutated under the pool latch.
pub struct Frame {
    inner: Arc<RwLock<Page>>,
    pin_count: Arc<AtomicI32>,
    is_dirty: Arc<AtomicBool>,
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        Frame {
            inner: Arc::clone(&self.inner),
            pin_count: Arc::clone(&self.pin_count),
            is_dirty: Arc::clone(&self.is_dirty),
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("pin_count", &self.pin_count())
            .field("is_dirty", &self.is_dirty())
            .finish()
    }
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Page::new())),
            pin_count: Arc::new(AtomicI32::new(0)),
            is_dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Acquire a read latch on the page.
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.inner.read()
    }

    /// Acquire a write latch on the page.
    ///
    /// Latching does not mark the frame dirty; callers report mutation
    /// through `unpin_page` or [`Frame::mark_dirty`].
    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.inner.write()
    }

    pub fn pin_count(&self) -> i32 {
        self.pin_count.load(Ordering::SeqCst)
    }

    /// Returns the new pin count.
    pub(crate) fn pin(&self) -> i32 {
        self.pin_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the new pin count.
    pub(crate) fn unpin(&self) -> i32 {
        self.pin_count.fetch_sub(1, Ordering::SeqCst) - 1
    }

    pub(crate) fn reset_pins(&self) {
        self.pin_count.store(0, Ordering::SeqCst);
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::SeqCst)
    }

    pub fn mark_dirty(&self) {
        self.is_dirty.store(true, Ordering::SeqCst);
    }

    pub(crate) fn or_dirty(&self, is_dirty: bool) {
        if is_dirty {
            self.is_dirty.store(true, Ordering::SeqCst);
        }
    }

    pub(crate) fn clear_dirty(&self) {
        self.is_dirty.store(false, Ordering::SeqCst);
    }
}
