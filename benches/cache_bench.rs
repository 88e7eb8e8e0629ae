//! Benchmarks for the cache driver over the in-process store.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scoped_cache_driver::{CacheDriver, MemoryStore, Namespace};

fn populated(keys: usize) -> CacheDriver<MemoryStore> {
    let mut cache = CacheDriver::new(MemoryStore::new(), Namespace::for_root("/bench/app"));
    for i in 0..keys {
        cache
            .set(&format!("key_{}", i), &format!("value_{}", i), 0)
            .expect("populate");
    }
    cache
}

/// Benchmark single-key operations.
fn bench_single_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_key");
    let mut cache = populated(10_000);

    group.bench_function("get_existing", |b| {
        let mut i = 0;
        b.iter(|| {
            let key = format!("key_{}", i % 10_000);
            black_box(cache.fetch::<String>(&key).expect("get"));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0;
        b.iter(|| {
            let key = format!("missing_{}", i);
            black_box(cache.fetch::<String>(&key).expect("get"));
            i += 1;
        });
    });

    group.bench_function("set_with_expiry", |b| {
        let mut i = 0;
        b.iter(|| {
            cache
                .set(&format!("ttl_key_{}", i), "value", 300)
                .expect("set");
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark scan-based bulk reads over a growing key space.
fn bench_get_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_all");

    for keys in [100usize, 1_000, 10_000].iter() {
        let mut cache = populated(*keys).scan_count(100);

        group.throughput(Throughput::Elements(*keys as u64));
        group.bench_with_input(BenchmarkId::new("prefix", keys), keys, |b, _| {
            b.iter(|| black_box(cache.get_all::<String>("key_").expect("get_all")));
        });
    }

    group.finish();
}

/// Benchmark prefix deletion, repopulating between iterations.
fn bench_delete_prefix(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete_prefix");

    group.bench_function("1000_keys", |b| {
        b.iter_batched(
            || populated(1_000),
            |mut cache| black_box(cache.delete_key_start_with("key_").expect("delete")),
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_single_key, bench_get_all, bench_delete_prefix);
criterion_main!(benches);
