//! Criterion benchmarks for burnman-decay.
//!
//! Covers: raw linear decay and the compensation/burn windows.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use burnman_core::traits::DecayCalculator;
use burnman_decay::engine::DecayEngine;
use burnman_decay::linear::decayed_amount;

fn bench_decayed_amount(c: &mut Criterion) {
    c.bench_function("decayed_amount", |b| {
        b.iter(|| {
            decayed_amount(
                black_box(1_000_000),
                black_box(800_000),
                black_box(900_000),
                black_box(796_320),
                black_box(0.0),
            )
        })
    });
}

fn bench_engine_windows(c: &mut Criterion) {
    let engine = DecayEngine::new();
    let chain_height = 900_000;

    c.bench_function("decayed_compensation_amount", |b| {
        b.iter(|| engine.decayed_compensation_amount(black_box(250_000), black_box(850_000), chain_height))
    });
    c.bench_function("decayed_burned_amount", |b| {
        b.iter(|| engine.decayed_burned_amount(black_box(250_000), black_box(880_000), chain_height))
    });
}

criterion_group!(benches, bench_decayed_amount, bench_engine_windows);
criterion_main!(benches);
