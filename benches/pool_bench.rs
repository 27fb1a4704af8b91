//! Allocator benchmarks across pool creation, allocation sizes, free/merge
//! churn, reallocation, and the two synchronization disciplines.
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mfalloc::config::{AllocatorConfig, PoolMode};
use mfalloc::pool::Pool;
use mfalloc::sync::{GlobalPool, LocalPool};
use std::sync::Arc;

const BENCH_REGION_SIZE: usize = 16 * 1024 * 1024;

fn create_pool() -> Pool {
    Pool::new(AllocatorConfig {
        region_size: BENCH_REGION_SIZE,
        eager: true,
        ..Default::default()
    })
    .unwrap()
}

fn bench_pool_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_creation");

    group.bench_function("lazy_default", |b| {
        b.iter(|| black_box(Pool::new(AllocatorConfig::default()).unwrap()))
    });

    group.bench_function("eager_16mib", |b| {
        b.iter(|| {
            black_box(
                Pool::new(AllocatorConfig {
                    region_size: BENCH_REGION_SIZE,
                    eager: true,
                    ..Default::default()
                })
                .unwrap(),
            )
        })
    });

    group.finish();
}

fn bench_allocation_small(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_small");

    let sizes = [8, 16, 32, 64, 128, 256];
    for &size in &sizes {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("size_{size}"), |b| {
            let mut pool = create_pool();
            b.iter(|| {
                let _ = black_box(pool.allocate(size));
            })
        });
    }

    group.finish();
}

fn bench_allocation_medium(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_medium");

    let sizes = [512, 1024, 2048, 4096, 8192];
    for &size in &sizes {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("size_{size}"), |b| {
            let mut pool = create_pool();
            b.iter(|| {
                let _ = black_box(pool.allocate(size));
            })
        });
    }

    group.finish();
}

fn bench_allocation_large(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_large");

    let sizes = [65536, 131072, 262144, 524288];
    for &size in &sizes {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("size_{size}"), |b| {
            let mut pool = create_pool();
            b.iter(|| {
                let _ = black_box(pool.allocate(size));
            })
        });
    }

    group.finish();
}

fn bench_allocate_then_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_then_free");

    group.bench_function("recycle_same_slot", |b| {
        let mut pool = create_pool();
        b.iter(|| {
            let ptr = pool.allocate(128).unwrap();
            black_box(ptr);
            pool.free(ptr).unwrap();
        })
    });

    group.finish();
}

fn bench_fragmentation_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmentation_churn");

    group.bench_function("interleaved_alloc_free", |b| {
        let mut pool = create_pool();
        let sizes = [16, 256, 64, 4096, 32, 1024];
        b.iter(|| {
            let mut live = Vec::with_capacity(sizes.len());
            for &size in &sizes {
                live.push(pool.allocate(size).unwrap());
            }
            for ptr in live.drain(..).rev() {
                pool.free(ptr).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_reallocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("reallocate");

    group.bench_function("grow_in_place", |b| {
        let mut pool = create_pool();
        b.iter(|| {
            let ptr = pool.allocate(64).unwrap();
            let grown = pool.reallocate(ptr, 256).unwrap().unwrap();
            black_box(grown);
            pool.free(grown).unwrap();
        })
    });

    group.bench_function("shrink_in_place", |b| {
        let mut pool = create_pool();
        b.iter(|| {
            let ptr = pool.allocate(4096).unwrap();
            let shrunk = pool.reallocate(ptr, 64).unwrap().unwrap();
            black_box(shrunk);
            pool.free(shrunk).unwrap();
        })
    });

    group.finish();
}

fn bench_region_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_growth");

    group.bench_function("forces_a_new_region", |b| {
        b.iter(|| {
            let mut pool = Pool::new(AllocatorConfig {
                region_size: 64 * 1024,
                ..Default::default()
            })
            .unwrap();
            let mut live = Vec::new();
            for _ in 0..2000 {
                live.push(pool.allocate(64).unwrap());
            }
            black_box(&live);
        })
    });

    group.finish();
}

fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");

    group.bench_function("sizes_cycled_100_times", |b| {
        let mut pool = create_pool();
        b.iter(|| {
            let sizes = [16, 32, 64, 128, 256, 512, 1024, 2048];
            for &size in sizes.iter().cycle().take(100) {
                let _ = pool.allocate(size);
            }
        })
    });

    group.finish();
}

fn bench_global_pool_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_contention");

    group.bench_function("global_pool_2_threads", |b| {
        let pool = Arc::new(GlobalPool::uninit());
        pool.init(AllocatorConfig {
            region_size: BENCH_REGION_SIZE,
            eager: true,
            pool_mode: PoolMode::Global,
            ..Default::default()
        })
        .unwrap();

        b.iter(|| {
            let p1 = Arc::clone(&pool);
            let p2 = Arc::clone(&pool);

            let handle = std::thread::spawn(move || {
                for _ in 0..500 {
                    if let Some(ptr) = p1.allocate(64) {
                        p1.free(ptr);
                    }
                }
            });

            for _ in 0..500 {
                if let Some(ptr) = p2.allocate(64) {
                    p2.free(ptr);
                }
            }
            handle.join().unwrap();
        })
    });

    group.finish();
}

fn bench_local_pool_independence(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_contention");

    group.bench_function("local_pool_2_threads", |b| {
        b.iter(|| {
            let make_worker = || {
                std::thread::spawn(move || {
                    let handle = LocalPool::handle();
                    handle
                        .init(AllocatorConfig {
                            region_size: BENCH_REGION_SIZE,
                            eager: true,
                            pool_mode: PoolMode::PerThread,
                            ..Default::default()
                        })
                        .unwrap();
                    for _ in 0..500 {
                        if let Some(ptr) = handle.allocate(64) {
                            handle.free(ptr);
                        }
                    }
                    handle.destroy();
                })
            };

            let t1 = make_worker();
            let t2 = make_worker();
            t1.join().unwrap();
            t2.join().unwrap();
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_pool_creation,
    bench_allocation_small,
    bench_allocation_medium,
    bench_allocation_large,
    bench_allocate_then_free,
    bench_fragmentation_churn,
    bench_reallocate,
    bench_region_growth,
    bench_mixed_workload,
    bench_global_pool_contention,
    bench_local_pool_independence,
);
criterion_main!(benches);
