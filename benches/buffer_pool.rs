//! Buffer pool and heap file benchmarks.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use slotstore::{BufferPoolManager, DiskManager, HeapFile, PageId};
use tempfile::tempdir;

fn bench_fetch_hit(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let bpm = BufferPoolManager::new(64, DiskManager::new());
    let file = bpm.create_file(dir.path().join("bench.db")).unwrap();
    let page_ids: Vec<PageId> = (0..32)
        .map(|_| bpm.new_page(file).unwrap().page_id())
        .collect();

    c.bench_function("fetch_page_hit", |b| {
        let mut i = 0;
        b.iter(|| {
            let guard = bpm.fetch_page(page_ids[i % page_ids.len()]).unwrap();
            black_box(guard.read().as_slice()[0]);
            i += 1;
        })
    });
}

fn bench_fetch_evicting(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let bpm = BufferPoolManager::new(8, DiskManager::new());
    let file = bpm.create_file(dir.path().join("bench.db")).unwrap();
    let page_ids: Vec<PageId> = (0..64)
        .map(|_| bpm.new_page(file).unwrap().page_id())
        .collect();
    bpm.flush_all_pages(file).unwrap();

    c.bench_function("fetch_page_evicting", |b| {
        let mut i = 0;
        b.iter(|| {
            let guard = bpm.fetch_page(page_ids[(i * 13) % page_ids.len()]).unwrap();
            black_box(guard.read().as_slice()[0]);
            i += 1;
        })
    });
}

fn bench_heap_insert(c: &mut Criterion) {
    c.bench_function("heap_insert_1000", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let bpm = Arc::new(BufferPoolManager::new(64, DiskManager::new()));
                let heap = HeapFile::create(bpm, dir.path().join("heap.db"), 64).unwrap();
                (dir, heap)
            },
            |(_dir, heap)| {
                let record = [0xABu8; 64];
                for _ in 0..1000 {
                    black_box(heap.insert_record(&record).unwrap());
                }
            },
            BatchSize::PerIteration,
        )
    });
}

criterion_group!(benches, bench_fetch_hit, bench_fetch_evicting, bench_heap_insert);
criterion_main!(benches);
