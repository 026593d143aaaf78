//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based lifetime through [`PageGuard`]
//! - Dirty page write-back on eviction
//! - Pluggable eviction policies (LRU by default)

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use parking_lot::Mutex;

use crate::buffer::frame::FrameMeta;
use crate::buffer::replacer::{LruReplacer, Replacer};
use crate::buffer::{BufferPoolStats, Frame, PageGuard};
use crate::common::config::DEFAULT_POOL_SIZE;
use crate::common::{Error, FileId, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                         │
/// │  ┌────────────────── state: Mutex ─────────────────────┐     │
/// │  │ page_table   PageId → FrameId                       │     │
/// │  │ meta         [pin_count, dirty, page_id] per frame  │     │
/// │  │ free_list    VecDeque<FrameId>                      │     │
/// │  │ disk_manager DiskManager                            │     │
/// │  └─────────────────────────────────────────────────────┘     │
/// │  ┌──────────────────────────┐  ┌──────────────────────┐      │
/// │  │ frames: Vec<Frame>       │  │ replacer (own lock)  │      │
/// │  │ [F0] [F1] [F2] ...       │  │ LruReplacer          │      │
/// │  └──────────────────────────┘  └──────────────────────┘      │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// Every public operation runs inside one critical section on `state`,
/// including the disk transfer it performs. The replacer synchronizes
/// itself. Each frame's bytes are behind their own `RwLock` latch.
///
/// # Latch Hierarchy
/// 1. `state` mutex
/// 2. replacer mutex
/// 3. frame latch
///
/// The pool only latches frames with pin count 0 or pages it is flushing.
/// Callers must release page latches before calling back into the pool.
///
/// # Usage
/// ```ignore
/// let bpm = BufferPoolManager::new(10, DiskManager::new());
/// let file = bpm.create_file("test.db")?;
///
/// let mut guard = bpm.new_page(file)?;
/// guard.write().as_mut_slice()[0] = 0xAB;
/// let page_id = guard.page_id();
/// drop(guard); // unpinned, dirty
///
/// let guard = bpm.fetch_page(page_id)?;
/// assert_eq!(guard.read().as_slice()[0], 0xAB);
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Page table, frame metadata, free list and disk I/O.
    state: Mutex<PoolState>,

    /// Eviction policy for selecting victim frames.
    replacer: Box<dyn Replacer>,

    /// Performance statistics.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

/// Everything mutated under the pool lock.
struct PoolState {
    page_table: HashMap<PageId, FrameId>,
    meta: Vec<FrameMeta>,
    /// Frames holding no page. Disjoint from the replacer's eligible set.
    free_list: VecDeque<FrameId>,
    disk_manager: DiskManager,
}

impl BufferPoolManager {
    /// Create a buffer pool with an LRU replacer.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk_manager: DiskManager) -> Self {
        Self::with_replacer(
            pool_size,
            disk_manager,
            Box::new(LruReplacer::new(pool_size)),
        )
    }

    /// Create a buffer pool with [`DEFAULT_POOL_SIZE`] frames.
    pub fn with_default_size(disk_manager: DiskManager) -> Self {
        Self::new(DEFAULT_POOL_SIZE, disk_manager)
    }

    /// Create a buffer pool with a custom eviction policy.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn with_replacer(
        pool_size: usize,
        disk_manager: DiskManager,
        replacer: Box<dyn Replacer>,
    ) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        let frames = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list = (0..pool_size).map(FrameId::new).collect();

        Self {
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::new(),
                meta: vec![FrameMeta::default(); pool_size],
                free_list,
                disk_manager,
            }),
            replacer,
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Files
    // ========================================================================

    /// Create a new database file.
    pub fn create_file<P: AsRef<Path>>(&self, path: P) -> Result<FileId> {
        self.state.lock().disk_manager.create_file(path)
    }

    /// Open an existing database file.
    pub fn open_file<P: AsRef<Path>>(&self, path: P) -> Result<FileId> {
        self.state.lock().disk_manager.open_file(path)
    }

    /// Write back and drop every resident page of `file`, then close it.
    ///
    /// # Errors
    /// - `Error::PagePinned` if any page of the file is still pinned;
    ///   nothing is dropped in that case
    /// - I/O errors from the writeback
    pub fn close_file(&self, file: FileId) -> Result<()> {
        let mut state = self.state.lock();

        let resident = Self::resident_pages(&state, file);
        if let Some(&(page_id, frame_id)) = resident
            .iter()
            .find(|(_, frame_id)| state.meta[frame_id.0].pin_count > 0)
        {
            return Err(Error::PagePinned {
                page_id,
                pin_count: state.meta[frame_id.0].pin_count,
            });
        }

        for (page_id, frame_id) in resident {
            if state.meta[frame_id.0].is_dirty {
                self.write_frame(&mut state, frame_id, page_id)?;
            }
            self.release_frame(&mut state, frame_id, page_id);
        }

        if let Some(path) = state.disk_manager.path(file) {
            log::debug!("closing {} ({})", file, path.display());
        }
        state.disk_manager.close_file(file)
    }

    /// Number of pages currently allocated in `file` on disk.
    pub fn file_page_count(&self, file: FileId) -> Result<u32> {
        self.state.lock().disk_manager.page_count(file)
    }

    // ========================================================================
    // Public API: Fetch and allocate
    // ========================================================================

    /// Pin a page, loading it from disk if it is not resident.
    ///
    /// A resident page is pinned again with no I/O. Otherwise a frame is
    /// taken from the free list or the replacer (writing back its old page
    /// if dirty) and the page is read into it.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if every frame is pinned
    /// - `Error::PageNotFound` / `Error::FileNotOpen` from the disk manager
    pub fn fetch_page(&self, page_id: PageId) -> Result<PageGuard<'_>> {
        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            state.meta[frame_id.0].pin_count += 1;
            self.replacer.pin(frame_id);
            self.stats.record_hit();
            log::trace!("hit {} in {}", page_id, frame_id);
            return Ok(PageGuard::new(self, frame_id, page_id));
        }

        self.stats.record_miss();
        let frame_id = self.acquire_frame(&mut state)?;

        let read = {
            let mut page = self.frames[frame_id.0].page_mut();
            state.disk_manager.read_page(page_id, page.as_mut_slice())
        };
        if let Err(err) = read {
            state.free_list.push_back(frame_id);
            return Err(err);
        }
        self.stats.record_read();
        log::trace!("loaded {} into {}", page_id, frame_id);

        self.install(&mut state, frame_id, page_id);
        Ok(PageGuard::new(self, frame_id, page_id))
    }

    /// Allocate a fresh page in `file` and pin it.
    ///
    /// The returned page is zeroed; its id is `guard.page_id()`.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if every frame is pinned
    /// - `Error::AllocationFailed` / `Error::FileNotOpen` from the disk manager
    pub fn new_page(&self, file: FileId) -> Result<PageGuard<'_>> {
        let mut state = self.state.lock();

        let frame_id = self.acquire_frame(&mut state)?;

        let page_no = match state.disk_manager.allocate_page(file) {
            Ok(page_no) => page_no,
            Err(err) => {
                state.free_list.push_back(frame_id);
                return Err(err);
            }
        };
        let page_id = PageId::new(file, page_no);

        self.frames[frame_id.0].page_mut().reset();
        self.stats.record_allocation();
        log::trace!("allocated {} in {}", page_id, frame_id);

        self.install(&mut state, frame_id, page_id);
        Ok(PageGuard::new(self, frame_id, page_id))
    }

    // ========================================================================
    // Public API: Flush and delete
    // ========================================================================

    /// Write a resident page to disk, pinned or not, and clear its dirty flag.
    ///
    /// # Errors
    /// - `Error::PageNotResident` if the page is not in the pool
    /// - I/O errors from the disk write
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let mut state = self.state.lock();

        let frame_id = *state
            .page_table
            .get(&page_id)
            .ok_or(Error::PageNotResident(page_id))?;

        self.write_frame(&mut state, frame_id, page_id)
    }

    /// Write every resident page of `file` to disk and clear their dirty flags.
    pub fn flush_all_pages(&self, file: FileId) -> Result<()> {
        let mut state = self.state.lock();

        if !state.disk_manager.is_open(file) {
            return Err(Error::FileNotOpen(file));
        }

        for (page_id, frame_id) in Self::resident_pages(&state, file) {
            self.write_frame(&mut state, frame_id, page_id)?;
        }

        Ok(())
    }

    /// Drop a page from the pool, returning its frame to the free list.
    ///
    /// A page that is not resident is already gone, so that succeeds. The
    /// page is written back first; it is not deallocated on disk.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the page is still pinned
    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(());
        };

        let pin_count = state.meta[frame_id.0].pin_count;
        if pin_count != 0 {
            return Err(Error::PagePinned { page_id, pin_count });
        }

        self.write_frame(&mut state, frame_id, page_id)?;
        self.release_frame(&mut state, frame_id, page_id);

        Ok(())
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Number of frames the replacer could evict right now.
    pub fn evictable_count(&self) -> usize {
        self.replacer.size()
    }

    /// Number of resident pages.
    pub fn page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// Pin count of a resident page, or `None` if it is not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        self.meta_of(page_id).map(|meta| meta.pin_count)
    }

    /// Dirty flag of a resident page, or `None` if it is not resident.
    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.meta_of(page_id).map(|meta| meta.is_dirty)
    }

    fn meta_of(&self, page_id: PageId) -> Option<FrameMeta> {
        let state = self.state.lock();
        state
            .page_table
            .get(&page_id)
            .map(|frame_id| state.meta[frame_id.0])
    }

    // ========================================================================
    // Internal: used by PageGuard
    // ========================================================================

    #[inline]
    pub(crate) fn frame(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id.0]
    }

    /// Give back one pin on a resident page.
    ///
    /// The dirty flag only ever goes up here: a clean unpin never hides an
    /// earlier pinner's unwritten change. Writeback clears it.
    ///
    /// # Errors
    /// - `Error::PageNotResident` if the page is not in the pool
    /// - `Error::PageNotPinned` if its pin count is already 0
    pub(crate) fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        let mut state = self.state.lock();

        let frame_id = *state
            .page_table
            .get(&page_id)
            .ok_or(Error::PageNotResident(page_id))?;

        let meta = &mut state.meta[frame_id.0];
        if meta.pin_count == 0 {
            return Err(Error::PageNotPinned(page_id));
        }

        meta.pin_count -= 1;
        meta.is_dirty |= is_dirty;

        if meta.pin_count == 0 {
            self.replacer.unpin(frame_id);
        }

        Ok(())
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Get an empty frame: free list first, then a replacer victim.
    fn acquire_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            debug_assert!(state.meta[frame_id.0].is_empty());
            return Ok(frame_id);
        }

        let frame_id = self.replacer.victim().ok_or(Error::NoFreeFrames)?;
        let meta = state.meta[frame_id.0];
        debug_assert!(meta.is_evictable(), "victim {} is pinned", frame_id);

        if let Some(old_page_id) = meta.page_id {
            if meta.is_dirty {
                if let Err(err) = self.write_frame(state, frame_id, old_page_id) {
                    // Still resident and unpinned; first in line again.
                    self.replacer.restore(frame_id);
                    return Err(err);
                }
            }
            state.page_table.remove(&old_page_id);
            self.stats.record_eviction();
            log::debug!(
                "evicted {} from {} (dirty: {})",
                old_page_id,
                frame_id,
                meta.is_dirty
            );
        }

        state.meta[frame_id.0].reset();
        Ok(frame_id)
    }

    /// Map `page_id` to `frame_id` with a single pin.
    fn install(&self, state: &mut PoolState, frame_id: FrameId, page_id: PageId) {
        state.page_table.insert(page_id, frame_id);
        state.meta[frame_id.0] = FrameMeta::pinned(page_id);
        self.replacer.pin(frame_id);
    }

    /// Unmap an unpinned page and put its frame on the free list.
    fn release_frame(&self, state: &mut PoolState, frame_id: FrameId, page_id: PageId) {
        state.page_table.remove(&page_id);
        self.replacer.pin(frame_id);
        state.meta[frame_id.0].reset();
        self.frames[frame_id.0].page_mut().reset();
        state.free_list.push_back(frame_id);
    }

    /// Write a frame's bytes to disk and clear its dirty flag.
    fn write_frame(&self, state: &mut PoolState, frame_id: FrameId, page_id: PageId) -> Result<()> {
        {
            let page = self.frames[frame_id.0].page();
            state.disk_manager.write_page(page_id, page.as_slice())?;
        }
        state.meta[frame_id.0].is_dirty = false;
        self.stats.record_write();
        Ok(())
    }

    fn resident_pages(state: &PoolState, file: FileId) -> Vec<(PageId, FrameId)> {
        let mut pages: Vec<_> = state
            .page_table
            .iter()
            .filter(|(page_id, _)| page_id.file == file)
            .map(|(&page_id, &frame_id)| (page_id, frame_id))
            .collect();
        pages.sort();
        pages
    }

    /// Check the page table, free list and replacer against each other.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let state = self.state.lock();

        for (page_id, frame_id) in &state.page_table {
            assert_eq!(state.meta[frame_id.0].page_id, Some(*page_id));
        }
        let resident = state.meta.iter().filter(|meta| !meta.is_empty()).count();
        assert_eq!(resident, state.page_table.len());

        for frame_id in &state.free_list {
            assert!(state.meta[frame_id.0].is_empty(), "{} is free but holds a page", frame_id);
        }
        assert_eq!(resident + state.free_list.len(), self.pool_size);

        let evictable = state.meta.iter().filter(|meta| meta.is_evictable()).count();
        assert_eq!(evictable, self.replacer.size());
    }
}
