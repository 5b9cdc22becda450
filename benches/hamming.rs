//! Benchmarks for the Hamming distance kernel.
//!
//! These measure the three operators that dominate near-duplicate
//! detection cost: single-pair distance, one-probe-vs-corpus batch, and
//! all-pairs similarity.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use neardup::{batch_distance, find_similar_pairs, hamming};
use rand::prelude::*;

// === Generators ===

fn random_signatures(n: usize, len: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| (0..len).map(|_| rng.gen::<u8>()).collect())
        .collect()
}

// === Benchmarks ===

fn bench_distance_lengths(c: &mut Criterion) {
    let mut group = c.benchmark_group("hamming_distance");

    for len in [8, 16, 64, 256, 1024].iter() {
        group.throughput(Throughput::Bytes(*len as u64));

        let sigs = random_signatures(2, *len);
        let a = &sigs[0];
        let b = &sigs[1];

        group.bench_with_input(BenchmarkId::from_parameter(len), len, |bench, _| {
            bench.iter(|| hamming(black_box(a), black_box(b)).unwrap());
        });
    }

    group.finish();
}

fn bench_distance_unaligned_tail(c: &mut Criterion) {
    let mut group = c.benchmark_group("hamming_distance_tail");

    // Odd lengths force the byte-tail path on every call.
    for len in [7, 63, 65].iter() {
        let sigs = random_signatures(2, *len);
        let a = &sigs[0];
        let b = &sigs[1];

        group.bench_with_input(BenchmarkId::from_parameter(len), len, |bench, _| {
            bench.iter(|| hamming(black_box(a), black_box(b)).unwrap());
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_distance");

    for n in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*n as u64));

        let corpus = random_signatures(*n, 64);
        let probe = random_signatures(1, 64).remove(0);

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bench, _| {
            bench.iter(|| batch_distance(black_box(&probe), black_box(&corpus)).unwrap());
        });
    }

    group.finish();
}

fn bench_all_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_similar_pairs");
    group.sample_size(10);

    for n in [100, 500, 1_000].iter() {
        group.throughput(Throughput::Elements((*n * (*n - 1) / 2) as u64));

        let corpus = random_signatures(*n, 64);

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bench, _| {
            // Threshold in the near-duplicate regime: most pairs rejected.
            bench.iter(|| find_similar_pairs(black_box(&corpus), 128, None).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_distance_lengths,
    bench_distance_unaligned_tail,
    bench_batch,
    bench_all_pairs
);
criterion_main!(benches);
