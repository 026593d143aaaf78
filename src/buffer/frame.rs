//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds the bytes of whatever page currently occupies it.
//! The bookkeeping for that occupancy ([`FrameMeta`]: page id, pin count,
//! dirty flag) lives inside the pool's state and is only touched under the
//! pool lock.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// A frame in the buffer pool.
///
/// Frames are allocated once when the pool is built and reused across page
/// ids. The `RwLock` is the per-page latch: many readers or one writer.
pub struct Frame {
    page: RwLock<Page>,
}

impl Frame {
    /// Create a new frame holding a zeroed page.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
        }
    }

    /// Acquire the shared latch on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire the exclusive latch on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Occupancy metadata for one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameMeta {
    /// Which page is currently loaded, or None if the frame is empty.
    pub page_id: Option<PageId>,
    /// Number of outstanding pins.
    pub pin_count: u32,
    /// Whether the page has been modified since it was last written.
    pub is_dirty: bool,
}

impl FrameMeta {
    /// Metadata for a page that was just installed with one pin.
    pub fn pinned(page_id: PageId) -> Self {
        Self {
            page_id: Some(page_id),
            pin_count: 1,
            is_dirty: false,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.page_id.is_none()
    }

    #[inline]
    pub fn is_evictable(&self) -> bool {
        !self.is_empty() && self.pin_count == 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
