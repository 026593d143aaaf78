//! Storage layer - disk I/O and the raw page type.
//!
//! - [`DiskManager`] - Block I/O over a set of open files
//! - [`page`] - The 4KB page container

mod disk_manager;
pub mod page;

pub use disk_manager::DiskManager;
