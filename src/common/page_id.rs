//! File and page identifier types.

use std::fmt;

use super::config::INVALID_PAGE_NO;

/// Identifies an open file in the [`DiskManager`](crate::storage::DiskManager).
///
/// Ids are handed out by the disk manager when a file is created or opened
/// and are never reused for the lifetime of that disk manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new FileId.
    #[inline]
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}

/// Identifies a page: the file it lives in plus its page number.
///
/// This is the key of the buffer pool's page table. Page numbers are dense
/// per file and start at 0.
///
/// # Example
/// ```
/// use slotstore::{FileId, PageId};
///
/// let page_id = PageId::new(FileId::new(1), 42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.page_no, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub file: FileId,
    pub page_no: u32,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(file: FileId, page_no: u32) -> Self {
        PageId { file, page_no }
    }

    /// Check if the page number is a real page (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.page_no != INVALID_PAGE_NO
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Page({}:{})", self.file.0, self.page_no)
        } else {
            write!(f, "Page({}:INVALID)", self.file.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_invalid() {
        let pid = PageId::new(FileId::new(0), INVALID_PAGE_NO);
        assert!(!pid.is_valid());
        assert!(PageId::new(FileId::new(0), 0).is_valid());
    }

    #[test]
    fn test_page_id_ordering() {
        let f = FileId::new(1);
        assert!(PageId::new(f, 1) < PageId::new(f, 2));
        // Orders by file first.
        assert!(PageId::new(FileId::new(0), 9) < PageId::new(f, 0));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(FileId::new(3), 42)), "Page(3:42)");
        assert_eq!(
            format!("{}", PageId::new(FileId::new(3), INVALID_PAGE_NO)),
            "Page(3:INVALID)"
        );
        assert_eq!(format!("{}", FileId::new(7)), "File(7)");
    }
}
