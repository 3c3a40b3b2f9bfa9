// Benchmarks for the lock manager
// Measures acquire/release throughput against the in-memory store

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use keylock_core::{DistributedLockManager, LockSpec, MemoryStore, ReleaseMode, with_lock};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("Failed to build tokio runtime")
}

fn bench_acquire_release(c: &mut Criterion) {
    let rt = runtime();

    for mode in [ReleaseMode::Atomic, ReleaseMode::CheckThenDelete] {
        let manager = DistributedLockManager::new(Arc::new(MemoryStore::new()))
            .with_release_mode(mode);

        c.bench_function(&format!("acquire_release_{}", mode), |b| {
            b.to_async(&rt).iter(|| async {
                let token = manager.acquire("bench", 30).await.unwrap();
                black_box(manager.release("bench", &token).await.unwrap())
            })
        });
    }
}

fn bench_contended_acquire(c: &mut Criterion) {
    let rt = runtime();
    let manager = DistributedLockManager::new(Arc::new(MemoryStore::new()));
    let _held = rt.block_on(manager.acquire("held", 3600)).unwrap();

    c.bench_function("contended_acquire", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(manager.acquire("held", 30).await.is_err()) })
    });
}

fn bench_with_lock(c: &mut Criterion) {
    let rt = runtime();
    let manager = DistributedLockManager::new(Arc::new(MemoryStore::new()));
    let spec = LockSpec::new("guarded");

    c.bench_function("with_lock", |b| {
        b.to_async(&rt).iter(|| async {
            let result: Result<u32, keylock_core::GuardedError<String>> =
                with_lock(&manager, &spec, async { Ok(1) }).await;
            black_box(result.unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_acquire_release,
    bench_contended_acquire,
    bench_with_lock
);
criterion_main!(benches);
