//! Heap files of fixed-size records on top of the buffer pool.
//!
//! # Components
//! - [`HeapFile`] - Record insert/get/update/delete
//! - [`HeapScan`] - Forward scan over every live record address
//! - [`HeapFileHeader`] - Per-file metadata persisted in page 0
//! - [`HeapPage`] - Slotted-page view over a page's bytes
//! - [`RecordId`] / [`Record`] - Record address and owned payload
//!
//! # File Layout
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬─────┐
//! │ Page 0       │ Page 1       │ Page 2       │ ... │
//! │ file header  │ record page  │ record page  │     │
//! └──────────────┴──────────────┴──────────────┴─────┘
//! ```
//! Record pages with at least one free slot form a singly linked list
//! threaded through their page headers; its head is in the file header.

mod file_header;
mod heap_file;
mod page;
mod record;
mod scan;

pub use file_header::{HeapFileHeader, PageLayout};
pub use heap_file::HeapFile;
pub use page::{HeapPage, HeapPageHeader};
pub use record::{Record, RecordId};
pub use scan::HeapScan;
