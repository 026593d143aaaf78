//! Buffer pool manager scenario tests.
//!
//! Each test walks the pool through pin, unpin, eviction and writeback
//! states and checks pin counts and page contents at every step.

use slotstore::buffer::BufferPoolManager;
use slotstore::common::{FileId, PageId};
use slotstore::storage::DiskManager;
use slotstore::Error;
use tempfile::{tempdir, TempDir};

const FRAMES: usize = 10;

fn create_bpm(pool_size: usize) -> (BufferPoolManager, FileId, TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let bpm = BufferPoolManager::new(pool_size, DiskManager::new());
    let file = bpm.create_file(dir.path().join("test.db")).unwrap();
    (bpm, file, dir)
}

/// Allocate a page on disk and leave it unpinned.
fn allocate(bpm: &BufferPoolManager, file: FileId) -> PageId {
    bpm.new_page(file).unwrap().page_id()
}

/// Helper to write a string to page data.
fn copy_string(data: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    data[..bytes.len()].copy_from_slice(bytes);
    data[bytes.len()] = 0; // null terminator
}

/// Helper to read a null-terminated string from page data.
fn read_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).to_string()
}

// ============================================================================
// Basic
// ============================================================================

#[test]
fn test_very_basic() {
    let (bpm, file, _dir) = create_bpm(FRAMES);
    let str_data = "Hello, world!";

    let pid = {
        let mut guard = bpm.new_page(file).unwrap();
        copy_string(guard.write().as_mut_slice(), str_data);
        assert_eq!(read_string(guard.read().as_slice()), str_data);
        guard.page_id()
    };

    // Fetch it back twice.
    for _ in 0..2 {
        let guard = bpm.fetch_page(pid).unwrap();
        assert_eq!(read_string(guard.read().as_slice()), str_data);
    }

    assert!(bpm.delete_page(pid).is_ok());
    assert!(!bpm.contains_page(pid));

    // Deleted from the pool, not from disk.
    let guard = bpm.fetch_page(pid).unwrap();
    assert_eq!(read_string(guard.read().as_slice()), str_data);
}

// ============================================================================
// Pinning
// ============================================================================

#[test]
fn test_page_pin_easy() {
    let (bpm, file, _dir) = create_bpm(2);

    let temp_page_id1 = allocate(&bpm, file);
    let temp_page_id2 = allocate(&bpm, file);

    let str0 = "page0";
    let str1 = "page1";
    let str0_updated = "page0updated";
    let str1_updated = "page1updated";

    let (pageid0, pageid1) = {
        let mut page0 = bpm.new_page(file).unwrap();
        copy_string(page0.write().as_mut_slice(), str0);
        let mut page1 = bpm.new_page(file).unwrap();
        copy_string(page1.write().as_mut_slice(), str1);

        let (pageid0, pageid1) = (page0.page_id(), page1.page_id());
        assert_eq!(bpm.get_pin_count(pageid0), Some(1));
        assert_eq!(bpm.get_pin_count(pageid1), Some(1));

        // All frames pinned.
        assert!(matches!(
            bpm.fetch_page(temp_page_id1),
            Err(Error::NoFreeFrames)
        ));
        assert!(matches!(bpm.new_page(file), Err(Error::NoFreeFrames)));

        page0.unpin(false).unwrap();
        assert_eq!(bpm.get_pin_count(pageid0), Some(0));
        drop(page1);
        assert_eq!(bpm.get_pin_count(pageid1), Some(0));

        (pageid0, pageid1)
    };

    {
        // Both data pages get evicted (and written back).
        let temp1 = bpm.fetch_page(temp_page_id1).unwrap();
        let temp2 = bpm.fetch_page(temp_page_id2).unwrap();
        assert!(!bpm.contains_page(pageid0));
        assert!(!bpm.contains_page(pageid1));
        drop(temp1);
        drop(temp2);
    }

    {
        let mut page0 = bpm.fetch_page(pageid0).unwrap();
        assert_eq!(read_string(page0.read().as_slice()), str0);
        copy_string(page0.write().as_mut_slice(), str0_updated);

        let mut page1 = bpm.fetch_page(pageid1).unwrap();
        assert_eq!(read_string(page1.read().as_slice()), str1);
        copy_string(page1.write().as_mut_slice(), str1_updated);

        assert_eq!(bpm.get_pin_count(pageid0), Some(1));
        assert_eq!(bpm.get_pin_count(pageid1), Some(1));
    }

    assert_eq!(bpm.get_pin_count(pageid0), Some(0));
    assert_eq!(bpm.get_pin_count(pageid1), Some(0));

    {
        let page0 = bpm.fetch_page(pageid0).unwrap();
        assert_eq!(read_string(page0.read().as_slice()), str0_updated);
        let page1 = bpm.fetch_page(pageid1).unwrap();
        assert_eq!(read_string(page1.read().as_slice()), str1_updated);
    }
}

#[test]
fn test_page_pin_medium() {
    let (bpm, file, _dir) = create_bpm(FRAMES);

    // Scenario: The buffer pool is empty. We should be able to create a new page.
    let mut page0 = bpm.new_page(file).unwrap();
    let pid0 = page0.page_id();

    // Scenario: Once we have a page, we should be able to read and write content.
    let hello = "Hello";
    copy_string(page0.write().as_mut_slice(), hello);
    assert_eq!(read_string(page0.read().as_slice()), hello);
    drop(page0);

    // Scenario: We should be able to create new pages until we fill up the buffer pool.
    let mut pages = Vec::new();
    for _ in 0..FRAMES {
        pages.push(bpm.new_page(file).unwrap());
    }

    // Scenario: All of the pin counts should be 1.
    for page in &pages {
        assert_eq!(bpm.get_pin_count(page.page_id()), Some(1));
    }

    // Scenario: Once the buffer pool is full, we should not be able to create any new pages.
    for _ in 0..FRAMES {
        assert!(matches!(bpm.new_page(file), Err(Error::NoFreeFrames)));
    }

    // Scenario: Drop the first 5 pages to unpin them.
    for _ in 0..(FRAMES / 2) {
        let pid = pages[0].page_id();
        assert_eq!(bpm.get_pin_count(pid), Some(1));
        pages.remove(0);
        assert_eq!(bpm.get_pin_count(pid), Some(0));
    }

    // Scenario: All of the pin counts of the pages we haven't dropped yet should still be 1.
    for page in &pages {
        assert_eq!(bpm.get_pin_count(page.page_id()), Some(1));
    }

    // Scenario: After unpinning pages, we should be able to create new pages.
    // This evicts some of the unpinned pages.
    for _ in 0..((FRAMES / 2) - 1) {
        pages.push(bpm.new_page(file).unwrap());
    }

    // Scenario: There should be one frame available, and we should be able to fetch the data
    // we wrote a while ago.
    {
        let original_page = bpm.fetch_page(pid0).unwrap();
        assert_eq!(read_string(original_page.read().as_slice()), hello);
    }

    // Scenario: Once we unpin page 0 and then make a new page, all the buffer pages should
    // now be pinned. Fetching page 0 again should fail.
    let _last_page = bpm.new_page(file).unwrap();
    assert!(matches!(bpm.fetch_page(pid0), Err(Error::NoFreeFrames)));
}

// ============================================================================
// Guards
// ============================================================================

#[test]
fn test_drop() {
    let (bpm, file, _dir) = create_bpm(FRAMES);

    {
        let page0 = bpm.new_page(file).unwrap();
        let pid0 = page0.page_id();

        // The page should be pinned.
        assert_eq!(bpm.get_pin_count(pid0), Some(1));

        // Releasing should unpin the page exactly once.
        page0.unpin(false).unwrap();
        assert_eq!(bpm.get_pin_count(pid0), Some(0));
    }

    let pid1 = allocate(&bpm, file);
    let pid2 = allocate(&bpm, file);

    {
        let read_guard = bpm.fetch_page(pid1).unwrap();
        let mut write_guard = bpm.fetch_page(pid2).unwrap();
        write_guard.mark_dirty();

        assert_eq!(bpm.get_pin_count(pid1), Some(1));
        assert_eq!(bpm.get_pin_count(pid2), Some(1));

        drop(read_guard);
        drop(write_guard);
        assert_eq!(bpm.get_pin_count(pid1), Some(0));
        assert_eq!(bpm.get_pin_count(pid2), Some(0));
        assert_eq!(bpm.is_dirty(pid1), Some(false));
        assert_eq!(bpm.is_dirty(pid2), Some(true));
    }

    // This will hang if the latches were not released by the guards.
    {
        let mut write_test1 = bpm.fetch_page(pid1).unwrap();
        let mut write_test2 = bpm.fetch_page(pid2).unwrap();
        let _latch1 = write_test1.write();
        let _latch2 = write_test2.write();
    }

    let mut page_ids = Vec::new();
    {
        // Fill up the pool.
        let mut guards = Vec::new();
        for _ in 0..FRAMES {
            let guard = bpm.new_page(file).unwrap();
            assert_eq!(bpm.get_pin_count(guard.page_id()), Some(1));
            page_ids.push(guard.page_id());
            guards.push(guard);
        }
    } // This drops all of the guards.

    for pid in &page_ids {
        assert_eq!(bpm.get_pin_count(*pid), Some(0));
    }

    // Get a new page and edit it. We will retrieve it later.
    let mutable_page_id = {
        let mut guard = bpm.new_page(file).unwrap();
        copy_string(guard.write().as_mut_slice(), "data");
        guard.page_id()
    };

    {
        // Fill up the pool again (evicts the mutable page).
        let mut guards = Vec::new();
        for _ in 0..FRAMES {
            guards.push(bpm.new_page(file).unwrap());
        }
        assert!(!bpm.contains_page(mutable_page_id));
    }

    // Retrieve the page we edited earlier.
    let guard = bpm.fetch_page(mutable_page_id).unwrap();
    assert_eq!(read_string(guard.read().as_slice()), "data");
}

#[test]
fn test_unpin_reports_dirty() {
    let (bpm, file, _dir) = create_bpm(FRAMES);
    let pid = allocate(&bpm, file);
    bpm.flush_page(pid).unwrap();
    assert_eq!(bpm.is_dirty(pid), Some(false));

    // A later clean unpin does not clear an earlier dirty one.
    let a = bpm.fetch_page(pid).unwrap();
    let b = bpm.fetch_page(pid).unwrap();
    assert_eq!(bpm.get_pin_count(pid), Some(2));
    a.unpin(true).unwrap();
    b.unpin(false).unwrap();
    assert_eq!(bpm.is_dirty(pid), Some(true));

    bpm.flush_page(pid).unwrap();
    assert_eq!(bpm.is_dirty(pid), Some(false));
}

// ============================================================================
// Eviction
// ============================================================================

/// A pinned page is never evicted.
#[test]
fn test_evictable() {
    let (bpm, file, _dir) = create_bpm(1);

    for i in 0..20u8 {
        let mut winner = bpm.new_page(file).unwrap();
        winner.write().as_mut_slice()[0] = i;
        let winner_pid = winner.page_id();

        // With the only frame pinned, nothing else can come in.
        let loser = allocate_or_fail(&bpm, file);
        assert!(matches!(loser, Err(Error::NoFreeFrames)));

        assert!(bpm.contains_page(winner_pid));
        assert_eq!(winner.read().as_slice()[0], i);
        assert_eq!(bpm.evictable_count(), 0);
        drop(winner);
        assert_eq!(bpm.evictable_count(), 1);
    }
}

fn allocate_or_fail(bpm: &BufferPoolManager, file: FileId) -> slotstore::Result<PageId> {
    bpm.new_page(file).map(|guard| guard.page_id())
}

#[test]
fn test_lru_victim_order() {
    let (bpm, file, _dir) = create_bpm(3);
    let pids: Vec<_> = (0..3).map(|_| allocate(&bpm, file)).collect();

    // Touch pid 0 so pid 1 becomes least recently unpinned.
    drop(bpm.fetch_page(pids[0]).unwrap());

    let newcomer = allocate(&bpm, file);
    assert!(bpm.contains_page(newcomer));
    assert!(!bpm.contains_page(pids[1]));
    assert!(bpm.contains_page(pids[0]));
    assert!(bpm.contains_page(pids[2]));
}

#[test]
fn test_delete_pinned_page() {
    let (bpm, file, _dir) = create_bpm(FRAMES);
    let guard = bpm.new_page(file).unwrap();
    let pid = guard.page_id();

    assert!(matches!(
        bpm.delete_page(pid),
        Err(Error::PagePinned { pin_count: 1, .. })
    ));
    drop(guard);

    let free_before = bpm.free_frame_count();
    bpm.delete_page(pid).unwrap();
    assert_eq!(bpm.free_frame_count(), free_before + 1);
    assert_eq!(bpm.get_pin_count(pid), None);
}
