//! LRU (Least-Recently-Unpinned) replacement policy.

use hashlink::LinkedHashSet;
use parking_lot::Mutex;

use super::Replacer;
use crate::common::FrameId;

/// Evicts the frame that has been eligible for eviction the longest.
///
/// Frames enter at the back of an insertion-ordered set when unpinned and
/// leave from the front when chosen as victim. Pinning removes a frame from
/// wherever it sits. All operations are O(1) and serialized by one mutex.
///
/// # Example
/// ```
/// use slotstore::buffer::replacer::{LruReplacer, Replacer};
/// use slotstore::FrameId;
///
/// let replacer = LruReplacer::new(4);
/// replacer.unpin(FrameId::new(2));
/// replacer.unpin(FrameId::new(0));
/// assert_eq!(replacer.victim(), Some(FrameId::new(2)));
/// ```
pub struct LruReplacer {
    /// Front = least recently unpinned.
    evictable: Mutex<LinkedHashSet<FrameId>>,

    /// Upper bound on tracked frames (the pool size).
    capacity: usize,
}

impl LruReplacer {
    /// Create a replacer tracking at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            evictable: Mutex::new(LinkedHashSet::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Replacer for LruReplacer {
    fn victim(&self) -> Option<FrameId> {
        self.evictable.lock().pop_front()
    }

    fn pin(&self, frame_id: FrameId) {
        self.evictable.lock().remove(&frame_id);
    }

    fn unpin(&self, frame_id: FrameId) {
        let mut evictable = self.evictable.lock();
        if !evictable.contains(&frame_id) && evictable.len() < self.capacity {
            evictable.insert(frame_id);
        }
    }

    fn restore(&self, frame_id: FrameId) {
        let mut evictable = self.evictable.lock();
        if evictable.contains(&frame_id) || evictable.len() >= self.capacity {
            return;
        }
        let rest = std::mem::take(&mut *evictable);
        evictable.insert(frame_id);
        evictable.extend(rest);
    }

    fn size(&self) -> usize {
        self.evictable.lock().len()
    }
}
