//! Slotted record page.
//!
//! ```text
//! ┌───────────────────┬─────────────┬──────────────┬────────┬────────┬─────┐
//! │ next_free_page_no │ num_records │ bitmap       │ slot 0 │ slot 1 │ ... │
//! │ u32 LE            │ u32 LE      │ bitmap_size  │        │        │     │
//! └───────────────────┴─────────────┴──────────────┴────────┴────────┴─────┘
//! ```
//! Bit `i` of the bitmap is set iff slot `i` holds a live record.

use super::file_header::PageLayout;
use crate::common::bitmap;
use crate::common::config::INVALID_PAGE_NO;

#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub(crate) fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn encode_page_no(page_no: Option<u32>) -> u32 {
    page_no.unwrap_or(INVALID_PAGE_NO)
}

#[inline]
pub(crate) fn decode_page_no(raw: u32) -> Option<u32> {
    (raw != INVALID_PAGE_NO).then_some(raw)
}

/// Header at the start of every record page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapPageHeader {
    /// Next page on the free-page list.
    pub next_free_page_no: Option<u32>,
    /// Number of set bits in the bitmap.
    pub num_records: u32,
}

impl HeapPageHeader {
    pub const SIZE: usize = 8;

    const OFFSET_NEXT_FREE: usize = 0;
    const OFFSET_NUM_RECORDS: usize = 4;

    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            next_free_page_no: decode_page_no(read_u32(data, Self::OFFSET_NEXT_FREE)),
            num_records: read_u32(data, Self::OFFSET_NUM_RECORDS),
        }
    }

    pub fn write_to(&self, data: &mut [u8]) {
        write_u32(
            data,
            Self::OFFSET_NEXT_FREE,
            encode_page_no(self.next_free_page_no),
        );
        write_u32(data, Self::OFFSET_NUM_RECORDS, self.num_records);
    }
}

/// A record page interpreted through a file's [`PageLayout`].
///
/// Borrows the page bytes; read accessors need `B: AsRef<[u8]>`, mutators
/// also need `AsMut<[u8]>`. Slot numbers must be below
/// `layout.records_per_page`.
pub struct HeapPage<B> {
    buf: B,
    layout: PageLayout,
}

impl<B: AsRef<[u8]>> HeapPage<B> {
    pub fn new(buf: B, layout: PageLayout) -> Self {
        Self { buf, layout }
    }

    pub fn header(&self) -> HeapPageHeader {
        HeapPageHeader::from_bytes(self.buf.as_ref())
    }

    pub fn num_records(&self) -> u32 {
        read_u32(self.buf.as_ref(), HeapPageHeader::OFFSET_NUM_RECORDS)
    }

    pub fn next_free_page_no(&self) -> Option<u32> {
        decode_page_no(read_u32(self.buf.as_ref(), HeapPageHeader::OFFSET_NEXT_FREE))
    }

    pub fn is_full(&self) -> bool {
        self.num_records() as usize >= self.layout.records_per_page
    }

    pub fn is_occupied(&self, slot_no: u32) -> bool {
        bitmap::is_set(self.bitmap(), slot_no as usize)
    }

    /// Lowest free slot.
    pub fn first_free_slot(&self) -> Option<u32> {
        bitmap::first_clear(self.bitmap(), self.layout.records_per_page).map(|slot| slot as u32)
    }

    /// Lowest occupied slot at or after `from`.
    pub fn next_occupied_slot(&self, from: u32) -> Option<u32> {
        bitmap::next_set(self.bitmap(), from as usize, self.layout.records_per_page)
            .map(|slot| slot as u32)
    }

    pub fn slot(&self, slot_no: u32) -> &[u8] {
        let range = self.slot_range(slot_no);
        &self.buf.as_ref()[range]
    }

    fn bitmap(&self) -> &[u8] {
        let start = HeapPageHeader::SIZE;
        &self.buf.as_ref()[start..start + self.layout.bitmap_size]
    }

    fn slot_range(&self, slot_no: u32) -> std::ops::Range<usize> {
        debug_assert!((slot_no as usize) < self.layout.records_per_page);
        let start = self.layout.slots_offset() + slot_no as usize * self.layout.record_size;
        start..start + self.layout.record_size
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> HeapPage<B> {
    /// Format as an empty record page that is not on the free list.
    pub fn init(&mut self) {
        let end = self.layout.slots_offset();
        self.buf.as_mut()[..end].fill(0);
        self.set_header(&HeapPageHeader::default());
    }

    pub fn set_header(&mut self, header: &HeapPageHeader) {
        header.write_to(self.buf.as_mut());
    }

    pub fn set_num_records(&mut self, num_records: u32) {
        write_u32(
            self.buf.as_mut(),
            HeapPageHeader::OFFSET_NUM_RECORDS,
            num_records,
        );
    }

    pub fn set_next_free_page_no(&mut self, page_no: Option<u32>) {
        write_u32(
            self.buf.as_mut(),
            HeapPageHeader::OFFSET_NEXT_FREE,
            encode_page_no(page_no),
        );
    }

    pub fn set_occupied(&mut self, slot_no: u32) {
        bitmap::set(self.bitmap_mut(), slot_no as usize);
    }

    pub fn clear_occupied(&mut self, slot_no: u32) {
        bitmap::reset(self.bitmap_mut(), slot_no as usize);
    }

    pub fn slot_mut(&mut self, slot_no: u32) -> &mut [u8] {
        let range = self.slot_range(slot_no);
        &mut self.buf.as_mut()[range]
    }

    fn bitmap_mut(&mut self) -> &mut [u8] {
        let start = HeapPageHeader::SIZE;
        let end = start + self.layout.bitmap_size;
        &mut self.buf.as_mut()[start..end]
    }
}
