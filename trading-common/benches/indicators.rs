use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use trading_common::backtest::indicators::{bollinger_bands, moving_average, rolling_zscore, rsi};
use trading_common::backtest::{BacktestEngine, MaRsiParams};
use trading_common::backtest::strategy::MaRsiCombo;
use trading_common::data::{PriceBar, PriceSeries};

fn synthetic_closes(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            100.0 + 10.0 * (t * 0.05).sin() + 3.0 * (t * 0.31).cos()
        })
        .collect()
}

fn synthetic_series(len: usize) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 14, 30, 0).unwrap();
    let bars = synthetic_closes(len)
        .into_iter()
        .enumerate()
        .map(|(i, close)| {
            PriceBar::from_close(
                start + Duration::hours(i as i64),
                Decimal::try_from(close).unwrap(),
            )
        })
        .collect();
    PriceSeries::new("BENCH", bars).unwrap()
}

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");

    for size in [250, 2_500, 25_000].iter() {
        let closes = synthetic_closes(*size);
        let other: Vec<f64> = closes.iter().map(|c| c * 0.98 + 1.0).collect();

        group.bench_with_input(BenchmarkId::new("moving_average", size), &closes, |b, closes| {
            b.iter(|| moving_average(black_box(closes), 20));
        });
        group.bench_with_input(BenchmarkId::new("rsi", size), &closes, |b, closes| {
            b.iter(|| rsi(black_box(closes), 14));
        });
        group.bench_with_input(BenchmarkId::new("bollinger", size), &closes, |b, closes| {
            b.iter(|| bollinger_bands(black_box(closes), 20, 2.0));
        });
        group.bench_with_input(BenchmarkId::new("zscore", size), &closes, |b, closes| {
            b.iter(|| rolling_zscore(black_box(closes), black_box(&other), 15));
        });
    }
    group.finish();
}

fn bench_backtest(c: &mut Criterion) {
    let series = synthetic_series(5_000);
    let strategy = MaRsiCombo::new(MaRsiParams::default());
    let engine = BacktestEngine::new();

    c.bench_function("ma_rsi_backtest_5000", |b| {
        b.iter(|| engine.run(black_box(&series), &strategy).unwrap());
    });
}

criterion_group!(benches, bench_indicators, bench_backtest);
criterion_main!(benches);
