//! Forward scan over a heap file.

use super::heap_file::HeapFile;
use super::page::HeapPage;
use super::record::RecordId;
use crate::common::config::FIRST_RECORD_PAGE;
use crate::common::{Error, Result};

/// Cursor over the live record addresses of a [`HeapFile`], in
/// (page, slot) order.
///
/// Holds no pin between steps. Records inserted or deleted while a scan is
/// in progress may or may not be observed.
///
/// # Example
/// ```ignore
/// let mut scan = heap.scan()?;
/// while !scan.at_end() {
///     let record = heap.get_record(scan.rid())?;
///     scan.advance()?;
/// }
/// ```
pub struct HeapScan<'f> {
    heap: &'f HeapFile,
    rid: RecordId,
    at_end: bool,
    /// Error from the last advance, reported by the next `next()` call.
    pending: Option<Error>,
}

impl<'f> HeapScan<'f> {
    /// Position on the first live record, or at end if there is none.
    pub fn new(heap: &'f HeapFile) -> Result<Self> {
        let mut scan = Self {
            heap,
            rid: RecordId::new(FIRST_RECORD_PAGE, 0),
            at_end: false,
            pending: None,
        };
        scan.seek(FIRST_RECORD_PAGE, 0)?;
        Ok(scan)
    }

    /// Current position. Meaningless once [`HeapScan::at_end`] is true.
    #[inline]
    pub fn rid(&self) -> RecordId {
        self.rid
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.at_end
    }

    /// Move to the next live record after the current one.
    ///
    /// A no-op at end.
    pub fn advance(&mut self) -> Result<()> {
        if self.at_end {
            return Ok(());
        }
        self.seek(self.rid.page_no, self.rid.slot_no + 1)
    }

    /// Stop at the first occupied slot at or after `(page_no, slot_no)`.
    fn seek(&mut self, mut page_no: u32, mut slot_no: u32) -> Result<()> {
        loop {
            let header = self.heap.header();
            if page_no >= header.num_pages {
                self.rid = RecordId::new(header.num_pages, 0);
                self.at_end = true;
                return Ok(());
            }

            let guard = self.heap.fetch_record_page(&header, page_no)?;
            let found = {
                let page = guard.read();
                HeapPage::new(page.as_slice(), header.layout()).next_occupied_slot(slot_no)
            };
            drop(guard);

            if let Some(slot_no) = found {
                self.rid = RecordId::new(page_no, slot_no);
                return Ok(());
            }
            page_no += 1;
            slot_no = 0;
        }
    }
}

impl Iterator for HeapScan<'_> {
    type Item = Result<RecordId>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            self.at_end = true;
            return Some(Err(err));
        }
        if self.at_end {
            return None;
        }

        let rid = self.rid;
        if let Err(err) = self.advance() {
            self.pending = Some(err);
        }
        Some(Ok(rid))
    }
}
