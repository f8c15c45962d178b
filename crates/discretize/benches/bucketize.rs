//! Bucketing and adapt throughput.
//!
//! Run with: `cargo bench --bench bucketize`

use std::time::Duration;

use discretize::{Discretizer, OutputMode, Parallelism, Tensor};

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(5))
        .sample_size(20)
}

fn random_matrix(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-3.0..3.0))
}

fn learned_layer(num_bins: usize, mode: OutputMode, sample: &Tensor) -> Discretizer {
    let mut layer = Discretizer::with_num_bins(num_bins, mode).unwrap();
    layer.adapt(sample).unwrap();
    layer
}

// =============================================================================
// Apply
// =============================================================================

fn bench_apply_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply/mode");
    let input = Tensor::from(random_matrix(10_000, 16, 42));
    group.throughput(Throughput::Elements(10_000 * 16));

    for mode in [
        OutputMode::Int,
        OutputMode::OneHot,
        OutputMode::MultiHot,
        OutputMode::Count,
    ] {
        let layer = learned_layer(32, mode, &input);
        group.bench_with_input(BenchmarkId::from_parameter(mode), &input, |b, x| {
            b.iter(|| black_box(layer.apply(black_box(x)).unwrap()))
        });
    }
    group.finish();
}

fn bench_apply_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply/parallel");

    for n_rows in [1_000usize, 100_000] {
        let input = Tensor::from(random_matrix(n_rows, 8, 7));
        let layer = learned_layer(256, OutputMode::Int, &input);
        group.throughput(Throughput::Elements((n_rows * 8) as u64));

        for parallelism in [Parallelism::Sequential, Parallelism::Parallel] {
            group.bench_with_input(
                BenchmarkId::new(format!("{parallelism:?}"), n_rows),
                &input,
                |b, x| b.iter(|| black_box(layer.apply_with(black_box(x), parallelism).unwrap())),
            );
        }
    }
    group.finish();
}

// =============================================================================
// Adapt
// =============================================================================

fn bench_adapt(c: &mut Criterion) {
    let mut group = c.benchmark_group("adapt");

    for epsilon in [0.01, 0.001] {
        let batches: Vec<Tensor> = (0..10)
            .map(|seed| Tensor::from(random_matrix(5_000, 4, seed)))
            .collect();
        group.throughput(Throughput::Elements(10 * 5_000 * 4));

        group.bench_with_input(BenchmarkId::new("epsilon", epsilon), &batches, |b, batches| {
            b.iter(|| {
                let config = discretize::DiscretizerConfig::builder()
                    .num_bins(64)
                    .epsilon(epsilon)
                    .build();
                let mut layer = Discretizer::new(config).unwrap();
                layer.adapt_batches(batches.iter()).unwrap();
                black_box(layer)
            })
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = bench_criterion();
    targets = bench_apply_modes, bench_apply_parallel, bench_adapt
}
criterion_main!(benches);
