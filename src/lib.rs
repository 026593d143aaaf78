//! slotstore - A buffer pool with LRU eviction and fixed-size-record heap files.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           slotstore                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Heap Files (heap/)                         │   │
//! │  │   HeapFile + HeapScan + slotted pages + free-page list   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Buffer Pool (buffer/)                      │   │
//! │  │   BufferPoolManager + PageGuard + LruReplacer + Stats    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │              DiskManager (many files) + Page             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config, bitmap)
//! - [`storage`] - Page-granular file I/O
//! - [`buffer`] - Buffer pool and replacement policy
//! - [`heap`] - Heap files of fixed-size records
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use slotstore::{BufferPoolManager, DiskManager, HeapFile};
//!
//! let bpm = Arc::new(BufferPoolManager::new(64, DiskManager::new()));
//! let heap = HeapFile::create(Arc::clone(&bpm), "accounts.db", 32)?;
//!
//! let rid = heap.insert_record(&[7u8; 32])?;
//! for rid in heap.scan()? {
//!     let record = heap.get_record(rid?)?;
//!     assert_eq!(record.len(), 32);
//! }
//! heap.delete_record(rid)?;
//! heap.close()?;
//! # Ok::<(), slotstore::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod heap;
pub mod storage;

pub use common::config::PAGE_SIZE;
pub use common::{Error, FileId, FrameId, PageId, Result};

pub use buffer::{BufferPoolManager, BufferPoolStats, Frame, PageGuard, StatsSnapshot};
pub use heap::{HeapFile, HeapFileHeader, HeapScan, Record, RecordId};
pub use storage::page::Page;
pub use storage::DiskManager;
