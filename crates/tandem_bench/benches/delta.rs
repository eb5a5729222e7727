//! Delta benchmarks: diff, apply, compose, transform.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tandem_bench::{edit_chain, random_edit, random_text};
use tandem_protocol::{create_delta, transform, Delta};

const SIZES: [usize; 3] = [100, 10_000, 100_000];

/// Benchmark diffing a text against a lightly edited copy.
fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    for size in SIZES {
        let old = random_text(size);
        let new = random_edit(&old, 16);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(create_delta(black_box(&old), black_box(&new))));
        });
    }

    group.finish();
}

/// Benchmark applying a delta.
fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    for size in SIZES {
        let old = random_text(size);
        let delta = create_delta(&old, &random_edit(&old, 16));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(delta.apply(black_box(&old))));
        });
    }

    group.finish();
}

/// Benchmark composing a chain of edits into one delta.
fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");

    for count in [10usize, 100, 1000] {
        let texts = edit_chain(&random_text(1000), count, 8);
        let deltas: Vec<Delta> = texts
            .windows(2)
            .map(|pair| create_delta(&pair[0], &pair[1]))
            .collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let composed = deltas
                    .iter()
                    .fold(Delta::new(), |acc, delta| acc.compose(delta));
                black_box(composed)
            });
        });
    }

    group.finish();
}

/// Benchmark transforming two concurrent edits.
fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for size in SIZES {
        let base = random_text(size);
        let a = create_delta(&base, &random_edit(&base, 16));
        let b_delta = create_delta(&base, &random_edit(&base, 16));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(transform(black_box(&a), black_box(&b_delta))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_diff, bench_apply, bench_compose, bench_transform);
criterion_main!(benches);
