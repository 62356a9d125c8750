// Copyright 2026 the Ifx Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use ifx_layout::{
    Bounded, ChunkedSequence, ContributionRef, Linker, SectionKind, SparseArray, SparseArrayMut,
    reserve,
};
use ifx_layout_wind_tunnel::staircase_fragments;

/// Entry point for `ifx_layout` wind-tunnel benchmarks.
///
/// Scenarios cover the arena on its own, sparse-map lookups, and whole links at a few input
/// sizes.
fn bench_layout(c: &mut Criterion) {
    bench_reserve(c);
    bench_sparse_get(c);
    bench_link(c);
    bench_copy(c);
}

/// Mixed-size aligned reservations that regularly spill into a new chunk.
fn bench_reserve(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve");
    for &count in &[100_usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut storage = ChunkedSequence::<u8>::new();
                for i in 0..count {
                    let region = reserve(&mut storage, black_box(4 + i % 40), 4).unwrap();
                    black_box(region);
                }
                storage.len()
            });
        });
    }
    group.finish();
}

/// Lookup cost in a full 64-slot map versus a sparse one.
fn bench_sparse_get(c: &mut Criterion) {
    type D = Bounded<64>;
    let mut group = c.benchmark_group("sparse_get");
    for &present in &[4_usize, 64] {
        let indices: Vec<D> = (0..64)
            .step_by(64 / present)
            .filter_map(D::new)
            .collect();
        let mut bytes = vec![0_u8; SparseArray::<D, u64>::size_bytes(indices.len())];
        let mut map = SparseArrayMut::<D, u64>::build(&mut bytes, indices.iter().copied()).unwrap();
        for index in &indices {
            map.set(*index, index.get() as u64).unwrap();
        }
        let view = map.as_view();
        group.bench_with_input(BenchmarkId::from_parameter(present), &present, |b, _| {
            b.iter(|| {
                let mut sum = 0_u64;
                for index in &indices {
                    sum = sum.wrapping_add(view.get(black_box(*index)).unwrap());
                }
                sum
            });
        });
    }
    group.finish();
}

/// Full scan and layout.
fn bench_link(c: &mut Criterion) {
    let mut group = c.benchmark_group("link");
    let linker = Linker::default();
    for &count in &[10_usize, 1_000, 10_000] {
        let input = staircase_fragments(count).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let link = linker.link(black_box(&input), None).unwrap();
                link.storage_stats().used_bytes
            });
        });
    }
    group.finish();
}

/// Internal fixup resolution over an already laid-out link.
fn bench_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy");
    let linker = Linker::default();
    for &count in &[10_usize, 1_000] {
        let input = staircase_fragments(count).unwrap();
        let link = linker.link(&input, None).unwrap();
        group.bench_with_input(BenchmarkId::new("report", count), &count, |b, _| {
            b.iter(|| link.copy_report(None).unwrap().resolved_count());
        });
        group.bench_with_input(BenchmarkId::new("resolve", count), &count, |b, _| {
            b.iter(|| {
                let mut found = 0_usize;
                for (kind, contributions) in link.outputs().iter() {
                    for index in 0..contributions.len() {
                        let from = ContributionRef::new(kind, u32::try_from(index).unwrap());
                        if link.resolve(from, SectionKind::Text).unwrap().is_some() {
                            found += 1;
                        }
                    }
                }
                found
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
