//! Common types and utilities shared across slotstore.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - Identifiers (FileId, PageId, FrameId)
//! - The packed occupancy bitmap

pub mod bitmap;
pub mod config;
pub mod error;
mod frame_id;
mod page_id;

pub use error::{Error, Result};
pub use frame_id::FrameId;
pub use page_id::{FileId, PageId};
