// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Statistics reduction microbenchmarks.
//!
//! Measures `RunMetrics::reduce` at sample counts typical of short and long
//! workload runs.

use std::time::Duration;

use conduit_bench::{RunMetrics, Sample};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Sample counts to benchmark.
const SAMPLE_COUNTS: &[usize] = &[100, 1_000, 10_000, 100_000];

/// Deterministic pseudo-random latencies with a few failures mixed in.
fn samples(count: usize) -> Vec<Sample> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let micros = 200 + state % 5_000;
            if i % 97 == 0 {
                Sample::failure(Duration::from_micros(micros))
            } else {
                Sample::success(Duration::from_micros(micros), Some(1 + state % 8))
            }
        })
        .collect()
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats_reduce");

    for &count in SAMPLE_COUNTS {
        let data = samples(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| RunMetrics::reduce(black_box(data), Duration::from_secs(10)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reduce);
criterion_main!(benches);
