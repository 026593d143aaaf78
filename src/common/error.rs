//! Error types for slotstore.

use std::path::PathBuf;

use thiserror::Error;

use super::{FileId, PageId};
use crate::heap::RecordId;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in slotstore.
///
/// Every failure is reported to the immediate caller; nothing here is
/// retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in its file.
    #[error("{0} not found")]
    PageNotFound(PageId),

    /// Page is not held by any frame of the buffer pool.
    #[error("{0} is not resident in the buffer pool")]
    PageNotResident(PageId),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when all frames are pinned.
    #[error("No free frames available in buffer pool")]
    NoFreeFrames,

    /// Attempted to unpin a page whose pin count is already 0.
    #[error("{0} is not pinned")]
    PageNotPinned(PageId),

    /// Attempted to delete or close a page that is still pinned.
    #[error("{page_id} is pinned (pin count {pin_count})")]
    PagePinned { page_id: PageId, pin_count: u32 },

    /// The disk manager could not hand out another page number.
    #[error("Cannot allocate a new page in {0}")]
    AllocationFailed(FileId),

    /// The file id is unknown to the disk manager.
    #[error("{0} is not open")]
    FileNotOpen(FileId),

    /// The path is already open in the disk manager.
    #[error("{} is already open", .0.display())]
    FileAlreadyOpen(PathBuf),

    /// Slot number is beyond the page's record capacity.
    #[error("Slot {slot_no} out of range (page holds {capacity} records)")]
    SlotOutOfRange { slot_no: u32, capacity: u32 },

    /// No live record at this address.
    #[error("No record at {0}")]
    RecordNotFound(RecordId),

    /// Record buffer length differs from the file's fixed record size.
    #[error("Record is {actual} bytes, file stores {expected}-byte records")]
    RecordSizeMismatch { expected: usize, actual: usize },

    /// A heap file cannot be created with this record size.
    #[error("Invalid record size: {0}")]
    InvalidRecordSize(usize),

    /// The heap file header failed validation.
    #[error("Corrupt file header: {0}")]
    CorruptFileHeader(String),

    /// A page taken from the free-page list had no free slot.
    #[error("{0} has no free slot")]
    PageFull(PageId),

    /// A record page's header disagrees with its bitmap.
    #[error("{0} is corrupt")]
    CorruptPage(PageId),
}
