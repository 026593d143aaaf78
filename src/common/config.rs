//! Configuration constants for slotstore.

/// Size of a page in bytes (4KB).
///
/// Every disk transfer and every buffer pool frame is exactly one page.
/// Pages are aligned to 4096 bytes in memory (see [`Page`](crate::storage::page::Page)).
pub const PAGE_SIZE: usize = 4096;

/// Number of frames used by [`BufferPoolManager::with_default_size`](crate::BufferPoolManager::with_default_size).
pub const DEFAULT_POOL_SIZE: usize = 64;

/// On-disk sentinel for "no page".
///
/// Free-page list links are persisted as raw `u32`s; this value terminates
/// the list. The disk manager never hands it out as a page number.
pub const INVALID_PAGE_NO: u32 = u32::MAX;

/// Page of a heap file holding the [`HeapFileHeader`](crate::heap::HeapFileHeader).
pub const FILE_HEADER_PAGE: u32 = 0;

/// First page of a heap file that stores records.
pub const FIRST_RECORD_PAGE: u32 = 1;

/// Maximum number of pages in one file.
pub const MAX_PAGES_PER_FILE: u64 = INVALID_PAGE_NO as u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_record_pages_follow_header_page() {
        assert!(FIRST_RECORD_PAGE > FILE_HEADER_PAGE);
        assert_ne!(FIRST_RECORD_PAGE, INVALID_PAGE_NO);
    }
}
