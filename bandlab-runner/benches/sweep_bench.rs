//! Criterion benchmarks for metric computation and grid sweeps.
//!
//! Run with: `cargo bench -p bandlab-runner`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bandlab_core::domain::Bar;
use bandlab_core::strategy::{StrategyConfig, StrategyKind};
use bandlab_runner::{
    run_single, FitnessMetric, MetricsConfig, ParamAxis, ParamGrid, ParamSweep,
    PerformanceMetrics,
};
use chrono::NaiveDate;

fn make_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2015, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut close = 100.0;
    (0..n)
        .map(|i| {
            close *= 1.0 + (i as f64 * 0.13).sin() * 0.01;
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

fn base_config() -> StrategyConfig {
    StrategyConfig::new(StrategyKind::LongShort)
}

fn bench_metrics(c: &mut Criterion) {
    let bars = make_bars(2520);
    let result = run_single(
        &bars,
        &base_config(),
        &Default::default(),
        &MetricsConfig::default(),
    )
    .unwrap();

    c.bench_function("metrics_compute_2520", |b| {
        b.iter(|| PerformanceMetrics::compute(black_box(&result.run), &MetricsConfig::default()))
    });
}

fn bench_sweep(c: &mut Criterion) {
    let bars = make_bars(1260);
    let grid = ParamGrid::new(vec![
        ParamAxis::new("atr_period", vec![5.0, 10.0, 14.0, 20.0]),
        ParamAxis::new("upper_band_multiplier", vec![1.5, 2.0, 2.5, 3.0]),
        ParamAxis::new("high_period", vec![5.0, 10.0]),
    ])
    .unwrap();

    let mut group = c.benchmark_group("sweep_32");
    group.sample_size(10);
    for parallel in [false, true] {
        let sweep =
            ParamSweep::new(base_config(), FitnessMetric::Sharpe).with_parallelism(parallel);
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_with_input(BenchmarkId::from_parameter(label), &bars, |b, bars| {
            b.iter(|| sweep.sweep(black_box(bars), &grid).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_metrics, bench_sweep);
criterion_main!(benches);
