//! Record-level operations on a heap file.

use std::path::Path;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use super::file_header::{HeapFileHeader, PageLayout};
use super::page::HeapPage;
use super::record::{Record, RecordId};
use super::scan::HeapScan;
use crate::buffer::{BufferPoolManager, PageGuard};
use crate::common::config::{FILE_HEADER_PAGE, FIRST_RECORD_PAGE};
use crate::common::{Error, FileId, PageId, Result};

/// An open heap file of fixed-size records.
///
/// All page access goes through the shared [`BufferPoolManager`]. The header
/// mutex serializes operations that change the free-page list or the page
/// count; it is always taken before any pool lock.
///
/// The header (page count and free-list head) lives in memory while the file
/// is open and reaches page 0 only through [`HeapFile::flush`] or
/// [`HeapFile::close`]. Dropping a handle without either leaves the file open
/// in the pool with a stale header on disk; records on pages it no longer
/// counts are lost on the next open.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use slotstore::{BufferPoolManager, DiskManager, HeapFile};
///
/// let bpm = Arc::new(BufferPoolManager::new(16, DiskManager::new()));
/// let heap = HeapFile::create(bpm, "people.db", 8)?;
/// let rid = heap.insert_record(b"abcdefgh")?;
/// assert_eq!(heap.get_record(rid)?.as_slice(), b"abcdefgh");
/// heap.close()?;
/// # Ok::<(), slotstore::Error>(())
/// ```
pub struct HeapFile {
    bpm: Arc<BufferPoolManager>,
    file: FileId,
    header: Mutex<HeapFileHeader>,
}

impl HeapFile {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create a new heap file at `path` holding `record_size`-byte records.
    ///
    /// # Errors
    /// - `Error::InvalidRecordSize` if a page cannot hold one record
    /// - I/O errors, including when `path` already exists
    pub fn create<P: AsRef<Path>>(
        bpm: Arc<BufferPoolManager>,
        path: P,
        record_size: usize,
    ) -> Result<Self> {
        let header = HeapFileHeader::new(record_size)?;
        let file = bpm.create_file(path)?;

        let heap = Self {
            bpm,
            file,
            header: Mutex::new(header),
        };
        if let Err(err) = heap.init_header_page(&header) {
            heap.abandon();
            return Err(err);
        }

        debug!(
            "created heap {}: {}-byte records, {} per page",
            file, header.record_size, header.records_per_page
        );
        Ok(heap)
    }

    /// Open an existing heap file.
    ///
    /// # Errors
    /// - `Error::CorruptFileHeader` if page 0 does not hold a valid header
    /// - `Error::FileAlreadyOpen` if the pool already has `path` open
    pub fn open<P: AsRef<Path>>(bpm: Arc<BufferPoolManager>, path: P) -> Result<Self> {
        let file = bpm.open_file(path)?;
        let header = match Self::read_header(&bpm, file) {
            Ok(header) => header,
            Err(err) => {
                if let Err(close_err) = bpm.close_file(file) {
                    debug!("failed to close {} after bad open: {}", file, close_err);
                }
                return Err(err);
            }
        };

        debug!(
            "opened heap {}: {} pages, free list head {:?}",
            file, header.num_pages, header.first_free_page_no
        );
        Ok(Self {
            bpm,
            file,
            header: Mutex::new(header),
        })
    }

    /// Persist the header and write every resident page of the file.
    pub fn flush(&self) -> Result<()> {
        let header = self.header.lock();
        self.write_header(&header)?;
        self.bpm.flush_all_pages(self.file)
    }

    /// Flush and close the file.
    ///
    /// # Errors
    /// `Error::PagePinned` if a page of this file is still pinned.
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.bpm.close_file(self.file)
    }

    fn init_header_page(&self, header: &HeapFileHeader) -> Result<()> {
        let guard = self.bpm.new_page(self.file)?;
        debug_assert_eq!(guard.page_id().page_no, FILE_HEADER_PAGE);
        guard.unpin(true)?;
        self.write_header(header)
    }

    fn abandon(&self) {
        if let Err(err) = self.bpm.close_file(self.file) {
            debug!("failed to close {} after bad create: {}", self.file, err);
        }
    }

    fn read_header(bpm: &BufferPoolManager, file: FileId) -> Result<HeapFileHeader> {
        let guard = bpm.fetch_page(PageId::new(file, FILE_HEADER_PAGE))?;
        let header = HeapFileHeader::from_bytes(guard.read().as_slice())?;
        drop(guard);

        let on_disk = bpm.file_page_count(file)?;
        if header.num_pages > on_disk {
            return Err(Error::CorruptFileHeader(format!(
                "header claims {} pages, file has {}",
                header.num_pages, on_disk
            )));
        }
        Ok(header)
    }

    fn write_header(&self, header: &HeapFileHeader) -> Result<()> {
        let mut guard = self
            .bpm
            .fetch_page(PageId::new(self.file, FILE_HEADER_PAGE))?;
        header.write_to(guard.write().as_mut_slice());
        guard.unpin(true)
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Copy out the record at `rid`.
    ///
    /// Does not check the occupancy bit; use [`HeapFile::is_record`] for that.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if `rid.page_no` is not a record page
    /// - `Error::SlotOutOfRange` if `rid.slot_no` is beyond page capacity
    pub fn get_record(&self, rid: RecordId) -> Result<Record> {
        let header = self.header();
        let layout = header.layout();
        check_slot(&layout, rid)?;

        let guard = self.fetch_record_page(&header, rid.page_no)?;
        let page = guard.read();
        let data = HeapPage::new(page.as_slice(), layout)
            .slot(rid.slot_no)
            .to_vec();
        Ok(Record::new(data))
    }

    /// Whether `rid` addresses a live record.
    pub fn is_record(&self, rid: RecordId) -> Result<bool> {
        let header = self.header();
        let layout = header.layout();
        check_slot(&layout, rid)?;

        let guard = self.fetch_record_page(&header, rid.page_no)?;
        let page = guard.read();
        let occupied = HeapPage::new(page.as_slice(), layout).is_occupied(rid.slot_no);
        Ok(occupied)
    }

    /// Store `buf` in the lowest free slot of the first page on the
    /// free-page list, allocating a page if the list is empty.
    ///
    /// # Errors
    /// - `Error::RecordSizeMismatch` if `buf` is not exactly one record
    /// - `Error::NoFreeFrames` / `Error::AllocationFailed` from the pool
    pub fn insert_record(&self, buf: &[u8]) -> Result<RecordId> {
        let mut header = self.header.lock();
        let layout = header.layout();
        check_size(&layout, buf)?;

        let mut guard = self.page_with_space(&mut header)?;
        let page_id = guard.page_id();
        let slot_no = {
            let mut page = guard.write();
            let mut heap_page = HeapPage::new(page.as_mut_slice(), layout);
            let slot_no = heap_page
                .first_free_slot()
                .ok_or(Error::PageFull(page_id))?;

            heap_page.slot_mut(slot_no).copy_from_slice(buf);
            heap_page.set_occupied(slot_no);
            let num_records = heap_page.num_records() + 1;
            heap_page.set_num_records(num_records);

            if heap_page.is_full() {
                header.first_free_page_no = heap_page.next_free_page_no();
                heap_page.set_next_free_page_no(None);
                debug!(
                    "{} is full, free list head now {:?}",
                    page_id, header.first_free_page_no
                );
            }
            slot_no
        };
        guard.unpin(true)?;

        Ok(RecordId::new(page_id.page_no, slot_no))
    }

    /// Overwrite the bytes at `rid` without touching the occupancy bitmap.
    ///
    /// Used to restore a record at a known address; the page must already
    /// exist.
    pub fn insert_record_at(&self, rid: RecordId, buf: &[u8]) -> Result<()> {
        self.write_slot(rid, buf)
    }

    /// Overwrite the bytes of the record at `rid`.
    pub fn update_record(&self, rid: RecordId, buf: &[u8]) -> Result<()> {
        self.write_slot(rid, buf)
    }

    /// Free the slot at `rid`.
    ///
    /// A page that goes from full to not-full is pushed onto the head of the
    /// free-page list.
    ///
    /// # Errors
    /// `Error::RecordNotFound` if the slot is already free.
    pub fn delete_record(&self, rid: RecordId) -> Result<()> {
        let mut header = self.header.lock();
        let layout = header.layout();
        check_slot(&layout, rid)?;

        let mut guard = self.fetch_record_page(&header, rid.page_no)?;
        if !HeapPage::new(guard.read().as_slice(), layout).is_occupied(rid.slot_no) {
            return Err(Error::RecordNotFound(rid));
        }

        {
            let mut page = guard.write();
            let mut heap_page = HeapPage::new(page.as_mut_slice(), layout);
            let was_full = heap_page.is_full();

            let num_records = heap_page
                .num_records()
                .checked_sub(1)
                .ok_or(Error::CorruptPage(PageId::new(self.file, rid.page_no)))?;
            heap_page.clear_occupied(rid.slot_no);
            heap_page.set_num_records(num_records);

            if was_full {
                heap_page.set_next_free_page_no(header.first_free_page_no);
                header.first_free_page_no = Some(rid.page_no);
                debug!("page {} rejoined the free list", rid.page_no);
            }
        }
        guard.unpin(true)
    }

    /// Iterate over every live record address in page/slot order.
    pub fn scan(&self) -> Result<HeapScan<'_>> {
        HeapScan::new(self)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn file_id(&self) -> FileId {
        self.file
    }

    pub fn record_size(&self) -> usize {
        self.header.lock().record_size as usize
    }

    pub fn records_per_page(&self) -> usize {
        self.header.lock().records_per_page as usize
    }

    /// Pages in the file, header page included.
    pub fn num_pages(&self) -> u32 {
        self.header.lock().num_pages
    }

    /// Snapshot of the in-memory header.
    pub fn header(&self) -> HeapFileHeader {
        *self.header.lock()
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPoolManager> {
        &self.bpm
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Pin record page `page_no`.
    pub(crate) fn fetch_record_page(
        &self,
        header: &HeapFileHeader,
        page_no: u32,
    ) -> Result<PageGuard<'_>> {
        let page_id = PageId::new(self.file, page_no);
        if page_no < FIRST_RECORD_PAGE || page_no >= header.num_pages {
            return Err(Error::PageNotFound(page_id));
        }
        self.bpm.fetch_page(page_id)
    }

    /// Pin the head of the free-page list, or allocate and link a new page.
    fn page_with_space(&self, header: &mut HeapFileHeader) -> Result<PageGuard<'_>> {
        if let Some(page_no) = header.first_free_page_no {
            return self.fetch_record_page(header, page_no);
        }

        let mut guard = self.bpm.new_page(self.file)?;
        let page_no = guard.page_id().page_no;
        {
            let mut page = guard.write();
            let mut heap_page = HeapPage::new(page.as_mut_slice(), header.layout());
            heap_page.init();
            heap_page.set_next_free_page_no(header.first_free_page_no);
        }
        header.first_free_page_no = Some(page_no);
        header.num_pages = header.num_pages.max(page_no + 1);

        debug!("allocated record page {} in {}", page_no, self.file);
        Ok(guard)
    }

    fn write_slot(&self, rid: RecordId, buf: &[u8]) -> Result<()> {
        let header = self.header();
        let layout = header.layout();
        check_size(&layout, buf)?;
        check_slot(&layout, rid)?;

        let mut guard = self.fetch_record_page(&header, rid.page_no)?;
        HeapPage::new(guard.write().as_mut_slice(), layout)
            .slot_mut(rid.slot_no)
            .copy_from_slice(buf);
        guard.unpin(true)
    }
}

fn check_size(layout: &PageLayout, buf: &[u8]) -> Result<()> {
    if buf.len() != layout.record_size {
        return Err(Error::RecordSizeMismatch {
            expected: layout.record_size,
            actual: buf.len(),
        });
    }
    Ok(())
}

fn check_slot(layout: &PageLayout, rid: RecordId) -> Result<()> {
    if rid.slot_no as usize >= layout.records_per_page {
        return Err(Error::SlotOutOfRange {
            slot_no: rid.slot_no,
            capacity: layout.records_per_page as u32,
        });
    }
    Ok(())
}
