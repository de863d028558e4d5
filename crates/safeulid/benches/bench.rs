use chrono::{TimeZone, Utc};
use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use safeulid::{
    Clock, DefaultEntropy, EntropySource, Factory, FixedClock, MonotonicGenerator, StdRandom,
    ThreadEntropy,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

// Number of IDs generated per benchmark iteration (split across threads for
// multi-threaded runs).
const TOTAL_IDS: usize = 4096;

fn fixed_clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

/// Benchmarks a bare generator with no pool in front of it.
fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/sequential");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for i in 0..iters {
                let mut generator = MonotonicGenerator::new(StdRandom::new());
                for _ in 0..TOTAL_IDS {
                    black_box(generator.generate(i).unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks one thread drawing every ID from a factory.
fn bench_factory<C, E>(c: &mut Criterion, group_name: &str, factory_fn: impl Fn() -> Factory<C, E>)
where
    C: Clock,
    E: EntropySource,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let factory = factory_fn();
                for _ in 0..TOTAL_IDS {
                    black_box(factory.generate().unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks a factory shared across threads.
fn bench_factory_contended<C, E>(
    c: &mut Criterion,
    group_name: &str,
    factory_fn: impl Fn() -> Factory<C, E>,
) where
    C: Clock,
    E: EntropySource,
{
    let mut group = c.benchmark_group(group_name);

    for thread_count in [1, 2, 4, 8, 16] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(
            format!("elems/{}/threads/{}", TOTAL_IDS, thread_count),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let factory = Arc::new(factory_fn());
                        let barrier = Arc::new(Barrier::new(thread_count + 1));
                        scope(|s| {
                            for _ in 0..thread_count {
                                let factory = Arc::clone(&factory);
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for _ in 0..ids_per_thread {
                                        black_box(factory.generate().unwrap());
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

fn benchmark_sequential_generator(c: &mut Criterion) {
    bench_generator(c);
}

fn benchmark_sequential_factory_default(c: &mut Criterion) {
    bench_factory(c, "factory/sequential/default", Factory::new_default);
}

fn benchmark_sequential_factory_thread_rng(c: &mut Criterion) {
    bench_factory(c, "factory/sequential/thread_rng", || {
        Factory::new(ThreadEntropy)
    });
}

fn benchmark_sequential_factory_fixed_clock(c: &mut Criterion) {
    bench_factory(c, "factory/sequential/fixed_clock", || {
        Factory::builder()
            .clock(fixed_clock())
            .entropy(DefaultEntropy)
            .build()
            .unwrap()
    });
}

fn benchmark_contended_factory_default(c: &mut Criterion) {
    bench_factory_contended(c, "factory/contended/default", Factory::new_default);
}

fn benchmark_contended_factory_fixed_clock(c: &mut Criterion) {
    bench_factory_contended(c, "factory/contended/fixed_clock", || {
        Factory::builder()
            .clock(fixed_clock())
            .entropy(DefaultEntropy)
            .build()
            .unwrap()
    });
}

fn benchmark_global(c: &mut Criterion) {
    let mut group = c.benchmark_group("global/sequential");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(safeulid::must_generate());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sequential_generator,
    benchmark_sequential_factory_default,
    benchmark_sequential_factory_thread_rng,
    benchmark_sequential_factory_fixed_clock,
    benchmark_contended_factory_default,
    benchmark_contended_factory_fixed_clock,
    benchmark_global,
);
criterion_main!(benches);
