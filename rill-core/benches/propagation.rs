//! Propagation benchmarks: wide fan-out from one signal and a deep chain of
//! computed values.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rill_core::{create_computed, create_effect, create_signal, Computed};

fn fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    for width in [1usize, 16, 256] {
        let (source, set_source) = create_signal(0u64);
        for _ in 0..width {
            let source = source.clone();
            create_effect(move || {
                black_box(source.get());
            });
        }

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                set_source.set(next);
            });
        });
    }
    group.finish();
}

fn computed_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("computed_chain");
    for depth in [1usize, 16, 128] {
        let (source, set_source) = create_signal(0u64);
        let head = {
            let source = source.clone();
            create_computed(move || source.get() + 1)
        };
        let mut tail: Computed<u64> = head;
        for _ in 1..depth {
            let prev = tail.clone();
            tail = create_computed(move || prev.get() + 1);
        }

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                set_source.set(next);
                black_box(tail.get_untracked())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, fan_out, computed_chain);
criterion_main!(benches);
