//! Criterion benchmarks for equal-frequency binning.
//!
//! Sizes mirror a three-batch window for one industry.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sd_math::{qcut, EqualFrequencyBins, PERCENTILE_BINS};

fn synthetic_scores(n: usize) -> Vec<f64> {
    // Deterministic, unsorted, with repeats every 97 entries.
    (0..n).map(|i| ((i * 7_919) % 9_973 % 97) as f64 + (i % 13) as f64 * 0.5).collect()
}

fn bench_binning(c: &mut Criterion) {
    let scores = synthetic_scores(30_000);

    let mut group = c.benchmark_group("binning");
    group.bench_function("fit_30k", |b| {
        b.iter(|| {
            let fitted = EqualFrequencyBins::fit(black_box(&scores), PERCENTILE_BINS);
            black_box(fitted.map(|f| f.reachable_bins()));
        })
    });
    group.bench_function("qcut_30k", |b| {
        b.iter(|| {
            let labels = qcut(black_box(&scores), PERCENTILE_BINS);
            black_box(labels.len());
        })
    });
    group.finish();
}

criterion_group!(benches, bench_binning);
criterion_main!(benches);
