//! RAII pin on a buffer pool page.
//!
//! A [`PageGuard`] is returned by `fetch_page` and `new_page` and owns
//! exactly one pin. Releasing the guard is the only way to drop that pin:
//! either explicitly with [`PageGuard::unpin`] or implicitly on drop.
//!
//! The pin keeps the frame resident; it does not lock the bytes. Access goes
//! through short-lived latches taken with [`PageGuard::read`] and
//! [`PageGuard::write`]. Never call into the pool while holding a latch.

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use super::buffer_pool_manager::BufferPoolManager;
use crate::common::{FrameId, PageId, Result};
use crate::storage::page::Page;

/// A pinned page.
///
/// # Example
/// ```ignore
/// let mut guard = bpm.fetch_page(page_id)?;
/// guard.write().as_mut_slice()[0] = 0xFF; // marks the guard dirty
/// let first = guard.read().as_slice()[0];
/// // guard drops here: page unpinned, dirty
/// ```
pub struct PageGuard<'a> {
    /// Reference back to BPM for unpin on release.
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    /// Dirty flag handed to the pool on release.
    is_dirty: bool,
    /// False once the pin has been given back.
    pinned: bool,
}

impl<'a> PageGuard<'a> {
    /// Called by the pool right after it pinned the frame.
    pub(crate) fn new(bpm: &'a BufferPoolManager, frame_id: FrameId, page_id: PageId) -> Self {
        Self {
            bpm,
            frame_id,
            page_id,
            is_dirty: false,
            pinned: true,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Whether this guard will report the page dirty on release.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Take the shared latch on the page bytes.
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.bpm.frame(self.frame_id).page()
    }

    /// Take the exclusive latch on the page bytes and mark the guard dirty.
    pub fn write(&mut self) -> RwLockWriteGuard<'_, Page> {
        self.is_dirty = true;
        self.bpm.frame(self.frame_id).page_mut()
    }

    /// Report the page dirty on release without touching it.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    /// Release the pin now, surfacing any pool error.
    ///
    /// `is_dirty` is combined with whatever `write()`/`mark_dirty()` already
    /// recorded.
    pub fn unpin(mut self, is_dirty: bool) -> Result<()> {
        self.pinned = false;
        self.bpm.unpin_page(self.page_id, self.is_dirty || is_dirty)
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        if !self.pinned {
            return;
        }
        if let Err(err) = self.bpm.unpin_page(self.page_id, self.is_dirty) {
            log::warn!("failed to unpin {} on guard drop: {}", self.page_id, err);
        }
    }
}
