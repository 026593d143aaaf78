//! Heap file header stored in page 0.
//!
//! ```text
//! Offset  Size  Field
//! 0       4     record_size
//! 4       4     num_pages
//! 8       4     records_per_page
//! 12      4     bitmap_size
//! 16      4     first_free_page_no (INVALID_PAGE_NO = none)
//! 20      4     crc32 of bytes 0..20
//! ```
//! All fields are little-endian `u32`s.

use super::page::{decode_page_no, encode_page_no, read_u32, write_u32, HeapPageHeader};
use crate::common::bitmap;
use crate::common::config::{FIRST_RECORD_PAGE, PAGE_SIZE};
use crate::common::{Error, Result};

/// Geometry of record pages, derived from the record size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub record_size: usize,
    pub records_per_page: usize,
    pub bitmap_size: usize,
}

impl PageLayout {
    /// Byte offset of slot 0.
    #[inline]
    pub fn slots_offset(&self) -> usize {
        HeapPageHeader::SIZE + self.bitmap_size
    }
}

/// Per-file metadata.
///
/// The in-memory copy held by an open `HeapFile` is authoritative; it is
/// written to page 0 on flush and close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapFileHeader {
    pub record_size: u32,
    /// Pages in the file, header page included.
    pub num_pages: u32,
    pub records_per_page: u32,
    pub bitmap_size: u32,
    /// Head of the free-page list.
    pub first_free_page_no: Option<u32>,
}

impl HeapFileHeader {
    pub const SIZE: usize = 24;

    const OFFSET_RECORD_SIZE: usize = 0;
    const OFFSET_NUM_PAGES: usize = 4;
    const OFFSET_RECORDS_PER_PAGE: usize = 8;
    const OFFSET_BITMAP_SIZE: usize = 12;
    const OFFSET_FIRST_FREE: usize = 16;
    const OFFSET_CHECKSUM: usize = 20;

    /// Header for a new, empty file of `record_size`-byte records.
    ///
    /// # Errors
    /// `Error::InvalidRecordSize` if a page cannot hold even one record.
    pub fn new(record_size: usize) -> Result<Self> {
        let records_per_page = Self::records_per_page_for(record_size)?;
        Ok(Self {
            record_size: record_size as u32,
            num_pages: FIRST_RECORD_PAGE,
            records_per_page: records_per_page as u32,
            bitmap_size: bitmap::bytes_for(records_per_page) as u32,
            first_free_page_no: None,
        })
    }

    /// Largest `n` such that the page header, an `n`-bit bitmap and `n`
    /// records fit in one page.
    fn records_per_page_for(record_size: usize) -> Result<usize> {
        let available = PAGE_SIZE - HeapPageHeader::SIZE;
        if record_size == 0 || record_size + 1 > available {
            return Err(Error::InvalidRecordSize(record_size));
        }

        let mut n = (available * 8) / (record_size * 8 + 1);
        while bitmap::bytes_for(n) + n * record_size > available {
            n -= 1;
        }
        Ok(n)
    }

    pub fn layout(&self) -> PageLayout {
        PageLayout {
            record_size: self.record_size as usize,
            records_per_page: self.records_per_page as usize,
            bitmap_size: self.bitmap_size as usize,
        }
    }

    pub fn write_to(&self, data: &mut [u8]) {
        write_u32(data, Self::OFFSET_RECORD_SIZE, self.record_size);
        write_u32(data, Self::OFFSET_NUM_PAGES, self.num_pages);
        write_u32(data, Self::OFFSET_RECORDS_PER_PAGE, self.records_per_page);
        write_u32(data, Self::OFFSET_BITMAP_SIZE, self.bitmap_size);
        write_u32(
            data,
            Self::OFFSET_FIRST_FREE,
            encode_page_no(self.first_free_page_no),
        );
        let checksum = crc32fast::hash(&data[..Self::OFFSET_CHECKSUM]);
        write_u32(data, Self::OFFSET_CHECKSUM, checksum);
    }

    /// Decode and validate a header.
    ///
    /// # Errors
    /// `Error::CorruptFileHeader` on checksum mismatch or inconsistent fields.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::CorruptFileHeader(format!(
                "header needs {} bytes, got {}",
                Self::SIZE,
                data.len()
            )));
        }

        let stored = read_u32(data, Self::OFFSET_CHECKSUM);
        let computed = crc32fast::hash(&data[..Self::OFFSET_CHECKSUM]);
        if stored != computed {
            return Err(Error::CorruptFileHeader(format!(
                "checksum mismatch: stored {stored:#010x}, computed {computed:#010x}"
            )));
        }

        let header = Self {
            record_size: read_u32(data, Self::OFFSET_RECORD_SIZE),
            num_pages: read_u32(data, Self::OFFSET_NUM_PAGES),
            records_per_page: read_u32(data, Self::OFFSET_RECORDS_PER_PAGE),
            bitmap_size: read_u32(data, Self::OFFSET_BITMAP_SIZE),
            first_free_page_no: decode_page_no(read_u32(data, Self::OFFSET_FIRST_FREE)),
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<()> {
        let expected = Self::new(self.record_size as usize)
            .map_err(|_| Error::CorruptFileHeader(format!("record size {}", self.record_size)))?;

        if self.records_per_page != expected.records_per_page
            || self.bitmap_size != expected.bitmap_size
        {
            return Err(Error::CorruptFileHeader(format!(
                "layout {}x{} does not match record size {}",
                self.records_per_page, self.bitmap_size, self.record_size
            )));
        }
        if self.num_pages < FIRST_RECORD_PAGE {
            return Err(Error::CorruptFileHeader(format!(
                "num_pages {}",
                self.num_pages
            )));
        }
        if let Some(page_no) = self.first_free_page_no {
            if page_no < FIRST_RECORD_PAGE || page_no >= self.num_pages {
                return Err(Error::CorruptFileHeader(format!(
                    "free list head {} outside 1..{}",
                    page_no, self.num_pages
                )));
            }
        }
        Ok(())
    }
}
