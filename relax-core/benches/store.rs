//! Store benchmarks: cached reads, write fan-out and chain invalidation.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use relax_core::{Cell, Computed, Registry, Store};

fn isolated() -> (Arc<Registry>, Store) {
    let registry = Arc::new(Registry::new());
    let store = Store::with_registry(registry.clone());
    (registry, store)
}

/// Benchmark reading a computed that is already cached
fn bench_cached_read(c: &mut Criterion) {
    let (registry, store) = isolated();
    let base = registry.register_cell(21_i64);
    let doubled = registry.register_computed(move |read| Ok(read.get(&base)? * 2));
    store.get(&doubled).unwrap();

    c.bench_function("cached_read", |b| {
        b.iter(|| black_box(store.get(&doubled).unwrap()));
    });
}

/// Benchmark a write that evicts many direct dependents, then reading them all
fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for n in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let (registry, store) = isolated();
            let source = registry.register_cell(0_i64);
            let dependents: Vec<Computed<i64>> = (0..n)
                .map(|i| registry.register_computed(move |read| Ok(read.get(&source)? + i)))
                .collect();
            for dependent in &dependents {
                store.get(dependent).unwrap();
            }

            let mut next = 0;
            b.iter(|| {
                next += 1;
                store.set(&source, next).unwrap();
                for dependent in &dependents {
                    black_box(store.get(dependent).unwrap());
                }
            });
        });
    }

    group.finish();
}

/// Benchmark invalidating and re-reading a linear chain of computeds
fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");

    for depth in [10, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let (registry, store) = isolated();
            let source: Cell<i64> = registry.register_cell(0);
            let mut tail = registry.register_computed(move |read| read.get(&source));
            for _ in 1..depth {
                let previous = tail;
                tail = registry.register_computed(move |read| Ok(read.get(&previous)? + 1));
            }
            store.get(&tail).unwrap();

            let mut next = 0;
            b.iter(|| {
                next += 1;
                store.set(&source, next).unwrap();
                black_box(store.get(&tail).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cached_read, bench_fan_out, bench_chain);
criterion_main!(benches);
