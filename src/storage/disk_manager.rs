//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Creating, opening and closing database files
//! - Reading and writing whole pages
//! - Allocating new pages at the end of a file

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::config::{MAX_PAGES_PER_FILE, PAGE_SIZE};
use crate::common::{Error, FileId, PageId, Result};

/// One open file.
struct FileEntry {
    file: File,
    path: PathBuf,
    /// Number of pages in the file.
    page_count: u32,
}

/// Manages disk I/O for a set of open database files.
///
/// # File Layout
/// Every file is a dense array of pages:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The `BufferPoolManager` owns it and
/// serializes every call under its own lock.
///
/// # Durability
/// Writes and allocations are followed by `fsync()`.
pub struct DiskManager {
    files: HashMap<FileId, FileEntry>,
    next_file_id: u32,
}

impl DiskManager {
    /// Create a disk manager with no open files.
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            next_file_id: 0,
        }
    }

    /// Create a new, empty database file and open it.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create_file<P: AsRef<Path>>(&mut self, path: P) -> Result<FileId> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;
        let path = fs::canonicalize(path)?;

        Ok(self.register(file, path, 0))
    }

    /// Open an existing database file.
    ///
    /// # Errors
    /// - `Error::FileAlreadyOpen` if this disk manager already has it open
    /// - I/O errors if the file doesn't exist or cannot be opened
    pub fn open_file<P: AsRef<Path>>(&mut self, path: P) -> Result<FileId> {
        let path = fs::canonicalize(path)?;
        if self.files.values().any(|entry| entry.path == path) {
            return Err(Error::FileAlreadyOpen(path));
        }

        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        // A torn trailing page is ignored.
        let page_count = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;

        Ok(self.register(file, path, page_count))
    }

    fn register(&mut self, file: File, path: PathBuf, page_count: u32) -> FileId {
        let file_id = FileId::new(self.next_file_id);
        self.next_file_id += 1;
        self.files.insert(
            file_id,
            FileEntry {
                file,
                path,
                page_count,
            },
        );
        file_id
    }

    /// Sync and close a file. Its id is never handed out again.
    pub fn close_file(&mut self, file_id: FileId) -> Result<()> {
        let entry = self
            .files
            .remove(&file_id)
            .ok_or(Error::FileNotOpen(file_id))?;
        entry.file.sync_all()?;
        Ok(())
    }

    /// Check whether a file id refers to an open file.
    pub fn is_open(&self, file_id: FileId) -> bool {
        self.files.contains_key(&file_id)
    }

    /// Canonical path of an open file.
    pub fn path(&self, file_id: FileId) -> Option<&Path> {
        self.files.get(&file_id).map(|entry| entry.path.as_path())
    }

    /// Read one page into `buf`.
    ///
    /// # Errors
    /// - `Error::FileNotOpen` for an unknown file
    /// - `Error::PageNotFound` if the page hasn't been allocated
    ///
    /// # Panics
    /// Panics if `buf` is not exactly `PAGE_SIZE` bytes.
    pub fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        assert_eq!(buf.len(), PAGE_SIZE, "page buffer must be PAGE_SIZE bytes");

        let entry = self.entry_mut(page_id)?;
        entry.file.seek(SeekFrom::Start(offset_of(page_id.page_no)))?;
        entry.file.read_exact(buf)?;

        Ok(())
    }

    /// Write one page from `buf`.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    ///
    /// # Errors
    /// - `Error::FileNotOpen` for an unknown file
    /// - `Error::PageNotFound` if the page hasn't been allocated
    ///
    /// # Panics
    /// Panics if `buf` is not exactly `PAGE_SIZE` bytes.
    pub fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> Result<()> {
        assert_eq!(buf.len(), PAGE_SIZE, "page buffer must be PAGE_SIZE bytes");

        let entry = self.entry_mut(page_id)?;
        entry.file.seek(SeekFrom::Start(offset_of(page_id.page_no)))?;
        entry.file.write_all(buf)?;
        entry.file.sync_all()?;

        Ok(())
    }

    /// Allocate a new zeroed page at the end of a file.
    ///
    /// Page numbers are handed out densely, starting at 0.
    ///
    /// # Errors
    /// - `Error::FileNotOpen` for an unknown file
    /// - `Error::AllocationFailed` once the file has run out of page numbers
    pub fn allocate_page(&mut self, file_id: FileId) -> Result<u32> {
        let entry = self
            .files
            .get_mut(&file_id)
            .ok_or(Error::FileNotOpen(file_id))?;

        let page_no = entry.page_count;
        if u64::from(page_no) >= MAX_PAGES_PER_FILE {
            return Err(Error::AllocationFailed(file_id));
        }

        entry.file.seek(SeekFrom::Start(offset_of(page_no)))?;
        entry.file.write_all(&[0u8; PAGE_SIZE])?;
        entry.file.sync_all()?;

        entry.page_count += 1;
        Ok(page_no)
    }

    /// Get the number of pages in a file.
    pub fn page_count(&self, file_id: FileId) -> Result<u32> {
        self.files
            .get(&file_id)
            .map(|entry| entry.page_count)
            .ok_or(Error::FileNotOpen(file_id))
    }

    /// Get the size of a file in bytes.
    pub fn file_size(&self, file_id: FileId) -> Result<u64> {
        Ok(offset_of(self.page_count(file_id)?))
    }

    fn entry_mut(&mut self, page_id: PageId) -> Result<&mut FileEntry> {
        let entry = self
            .files
            .get_mut(&page_id.file)
            .ok_or(Error::FileNotOpen(page_id.file))?;
        if page_id.page_no >= entry.page_count {
            return Err(Error::PageNotFound(page_id));
        }
        Ok(entry)
    }
}

impl Default for DiskManager {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn offset_of(page_no: u32) -> u64 {
    (page_no as u64) * (PAGE_SIZE as u64)
}
