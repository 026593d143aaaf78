//! Eviction policy implementations (replacers).
//!
//! A replacer tracks which resident frames are eligible for eviction and
//! picks the victim when the pool has no free frame. Implementations
//! synchronize internally, so every method takes `&self`.
//!
//! Currently implements:
//! - [`LruReplacer`] - Least-recently-unpinned eviction

mod lru;

pub use lru::LruReplacer;

use crate::common::FrameId;

/// Eviction policy used by the [`BufferPoolManager`](crate::BufferPoolManager).
pub trait Replacer: Send + Sync {
    /// Remove and return the frame to evict, or `None` if nothing is eligible.
    fn victim(&self) -> Option<FrameId>;

    /// The frame is in use: drop it from the eligible set (no-op if absent).
    fn pin(&self, frame_id: FrameId);

    /// The frame's pin count dropped to 0: make it eligible (no-op if tracked).
    fn unpin(&self, frame_id: FrameId);

    /// Hand back a frame returned by [`Replacer::victim`] that could not be
    /// evicted. It becomes the next victim again.
    fn restore(&self, frame_id: FrameId);

    /// Number of frames currently eligible for eviction.
    fn size(&self) -> usize;
}
