//! Rolling technical indicators.
//!
//! Every function returns a vector aligned 1:1 with its input. Positions
//! where the rolling window is not yet filled (or the value is otherwise
//! undefined) hold `None`; callers must never act on them.

use crate::data::{AlignedPair, PriceSeries};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Arithmetic mean of the trailing `window` closes, defined from index `window - 1`.
pub fn moving_average(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || window > closes.len() {
        return out;
    }
    for (offset, slice) in closes.windows(window).enumerate() {
        out[offset + window - 1] = Some(mean(slice));
    }
    out
}

/// Sample standard deviation (n - 1 denominator) over the trailing window.
/// A window below 2 has no sample deviation, so every entry is `None`.
///
/// Deviations within rounding error of the window mean are reported as
/// exactly zero.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window < 2 || window > values.len() {
        return out;
    }
    for (offset, slice) in values.windows(window).enumerate() {
        let m = mean(slice);
        let variance = slice.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (window - 1) as f64;
        let sd = variance.sqrt();
        out[offset + window - 1] = Some(if is_negligible(sd, m) { 0.0 } else { sd });
    }
    out
}

/// Relative Strength Index over simple trailing averages of gains and losses.
///
/// Index `i` uses the `period` price changes ending at `i`, so the first
/// `period` entries are undefined. An average loss of zero yields 100.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let mut gains = vec![0.0; closes.len()];
    let mut losses = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    for i in period..closes.len() {
        let start = i + 1 - period;
        let avg_gain = mean(&gains[start..=i]);
        let avg_loss = mean(&losses[start..=i]);
        if !(avg_gain.is_finite() && avg_loss.is_finite()) {
            continue;
        }
        out[i] = Some(if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        });
    }
    out
}

/// Middle, upper and lower Bollinger bands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerBands {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger_bands(closes: &[f64], window: usize, std_dev_multiplier: f64) -> BollingerBands {
    let middle = moving_average(closes, window);
    let std = rolling_std(closes, window);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(std.iter())
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => Some(m + sign * std_dev_multiplier * s),
                _ => None,
            })
            .collect()
    };

    let upper = band(1.0);
    let lower = band(-1.0);
    BollingerBands {
        middle,
        upper,
        lower,
    }
}

/// Z-score of the spread `a - b` against its own rolling mean and deviation.
///
/// Undefined where the window is not yet filled or the deviation is zero.
/// Output length is the shorter of the two inputs.
pub fn rolling_zscore(a: &[f64], b: &[f64], window: usize) -> Vec<Option<f64>> {
    let spread: Vec<f64> = a.iter().zip(b.iter()).map(|(x, y)| x - y).collect();
    let means = moving_average(&spread, window);
    let stds = rolling_std(&spread, window);

    spread
        .iter()
        .zip(means.iter().zip(stds.iter()))
        .map(|(s, (m, sd))| match (m, sd) {
            (Some(m), Some(sd)) if !is_negligible(*sd, *m) => Some((s - m) / sd),
            _ => None,
        })
        .collect()
}

/// Relative tolerance below which a deviation is treated as zero.
const ZERO_DEVIATION_TOLERANCE: f64 = 1e-9;

fn is_negligible(sd: f64, mean: f64) -> bool {
    sd <= ZERO_DEVIATION_TOLERANCE * mean.abs().max(1.0)
}

// A window of identical values averages to that value exactly.
fn mean(values: &[f64]) -> f64 {
    match values.split_first() {
        Some((first, rest)) if rest.iter().all(|v| v == first) => *first,
        _ => values.iter().sum::<f64>() / values.len() as f64,
    }
}

/// Indicator columns computed for one evaluation pass, aligned with the series.
///
/// Columns a strategy does not use stay `None` for every bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub timestamps: Vec<DateTime<Utc>>,
    pub close: Vec<f64>,
    pub fast_ma: Vec<Option<f64>>,
    pub slow_ma: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
    pub zscore: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn new(series: &PriceSeries) -> Self {
        let close = series.closes();
        let empty = vec![None; close.len()];
        Self {
            timestamps: series.timestamps(),
            close,
            fast_ma: empty.clone(),
            slow_ma: empty.clone(),
            rsi: empty.clone(),
            bb_middle: empty.clone(),
            bb_upper: empty.clone(),
            bb_lower: empty.clone(),
            zscore: empty,
        }
    }

    /// Frame over an aligned pair: `close` carries the first leg, `zscore`
    /// the spread z-score of first minus second.
    pub fn for_pair(pair: &AlignedPair, lookback_window: usize) -> Self {
        let mut frame = Self::new(&pair.first);
        frame.zscore = rolling_zscore(&frame.close, &pair.second.closes(), lookback_window);
        frame
    }

    pub fn with_moving_averages(mut self, fast_window: usize, slow_window: usize) -> Self {
        self.fast_ma = moving_average(&self.close, fast_window);
        self.slow_ma = moving_average(&self.close, slow_window);
        self
    }

    pub fn with_rsi(mut self, period: usize) -> Self {
        self.rsi = rsi(&self.close, period);
        self
    }

    pub fn with_bollinger(mut self, window: usize, std_dev_multiplier: f64) -> Self {
        let bands = bollinger_bands(&self.close, window, std_dev_multiplier);
        self.bb_middle = bands.middle;
        self.bb_upper = bands.upper;
        self.bb_lower = bands.lower;
        self
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Defined, finite value of a column at `index`
    pub fn value(column: &[Option<f64>], index: usize) -> Option<f64> {
        column.get(index).copied().flatten().filter(|v| v.is_finite())
    }

    pub fn close_at(&self, index: usize) -> Option<f64> {
        self.close.get(index).copied().filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SCENARIO: [f64; 10] = [10.0, 10.0, 10.0, 12.0, 8.0, 9.0, 11.0, 13.0, 9.0, 7.0];

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|v| (v - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_moving_average_scenario() {
        let fast = moving_average(&SCENARIO, 2);
        let slow = moving_average(&SCENARIO, 4);

        assert_eq!(fast.len(), SCENARIO.len());
        assert_eq!(slow.len(), SCENARIO.len());
        assert!(slow[..3].iter().all(Option::is_none));
        assert!(slow[3..].iter().all(Option::is_some));
        assert!(fast[0].is_none());
        assert!(approx(fast[1], 10.0));
        assert!(approx(slow[3], 10.5)); // (10+10+10+12)/4
        assert!(approx(slow[4], 10.0)); // (10+10+12+8)/4
    }

    #[test]
    fn test_rsi_monotonic_increase_is_100() {
        let period = 14;
        let closes: Vec<f64> = (0..=period).map(|i| 100.0 + i as f64).collect();
        let values = rsi(&closes, period);

        assert!(values[..period].iter().all(Option::is_none));
        assert_eq!(values[period], Some(100.0));
    }

    #[test]
    fn test_rsi_known_value() {
        // changes: +2, -1, +1 -> avg gain 1, avg loss 1/3 -> rs 3 -> 75
        let values = rsi(&[10.0, 12.0, 11.0, 12.0], 3);
        assert!(approx(values[3], 75.0));
    }

    #[test]
    fn test_rsi_monotonic_decrease_is_zero() {
        let values = rsi(&[5.0, 4.0, 3.0, 2.0], 3);
        assert!(approx(values[3], 0.0));
    }

    #[test]
    fn test_bollinger_bands_use_sample_deviation() {
        let bands = bollinger_bands(&[1.0, 2.0, 3.0], 3, 2.0);
        // mean 2, sample std 1
        assert!(approx(bands.middle[2], 2.0));
        assert!(approx(bands.upper[2], 4.0));
        assert!(approx(bands.lower[2], 0.0));
        assert!(bands.upper[1].is_none());
    }

    #[test]
    fn test_zscore_undefined_for_constant_spread() {
        let a = [0.1, 0.1, 0.1, 0.1];
        let b = [0.0, 0.0, 0.0, 0.0];
        assert!(rolling_zscore(&a, &b, 3).iter().all(Option::is_none));
    }

    #[test]
    fn test_zscore_undefined_for_flat_spread_with_rounding() {
        // Neither spread is exactly representable; the summed mean drifts from it.
        let cases = [(101.3, 50.1), (1000.1, 0.0)];
        for (a, b) in cases {
            let z = rolling_zscore(&[a; 20], &[b; 20], 15);
            assert_eq!(z.len(), 20);
            assert!(z.iter().all(Option::is_none), "{a} - {b}: {z:?}");
        }
    }

    #[test]
    fn test_rolling_std_of_flat_window_is_exactly_zero() {
        let values = [101.3 - 50.1; 20];
        let stds = rolling_std(&values, 15);
        assert!(stds[..14].iter().all(Option::is_none));
        assert!(stds[14..].iter().all(|sd| *sd == Some(0.0)));
    }

    #[test]
    fn test_flat_bollinger_bands_collapse_onto_close() {
        let closes = [101.3; 25];
        let bands = bollinger_bands(&closes, 20, 0.5);
        for i in 19..closes.len() {
            assert_eq!(bands.middle[i], Some(101.3));
            assert_eq!(bands.upper[i], Some(101.3));
            assert_eq!(bands.lower[i], Some(101.3));
        }
    }

    #[test]
    fn test_zscore_known_value() {
        // spread 1, 2, 3 -> mean 2, sample std 1 -> z = 1
        let z = rolling_zscore(&[2.0, 4.0, 6.0], &[1.0, 2.0, 3.0], 3);
        assert!(z[0].is_none() && z[1].is_none());
        assert!(approx(z[2], 1.0));
    }

    #[test]
    fn test_frame_columns_align_with_series() {
        use crate::data::{PriceBar, PriceSeries};
        use chrono::{Duration, TimeZone};
        use rust_decimal::Decimal;

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        let bars = SCENARIO
            .iter()
            .enumerate()
            .map(|(i, c)| {
                PriceBar::from_close(
                    start + Duration::hours(i as i64),
                    Decimal::try_from(*c).unwrap(),
                )
            })
            .collect();
        let series = PriceSeries::new("AAPL", bars).unwrap();
        let frame = IndicatorFrame::new(&series)
            .with_moving_averages(2, 4)
            .with_rsi(3)
            .with_bollinger(4, 2.0);

        for column in [
            &frame.fast_ma,
            &frame.slow_ma,
            &frame.rsi,
            &frame.bb_upper,
            &frame.zscore,
        ] {
            assert_eq!(column.len(), series.len());
        }
        assert!(frame.zscore.iter().all(Option::is_none));
    }

    proptest! {
        #[test]
        fn short_series_is_entirely_undefined(
            closes in proptest::collection::vec(1.0f64..500.0, 0..20),
            extra in 0usize..10,
        ) {
            let window = closes.len() + 1 + extra;
            prop_assert!(moving_average(&closes, window).iter().all(Option::is_none));
            prop_assert!(rsi(&closes, window).iter().all(Option::is_none));
            let bands = bollinger_bands(&closes, window, 2.0);
            prop_assert!(bands.middle.iter().all(Option::is_none));
            prop_assert!(bands.upper.iter().all(Option::is_none));
            prop_assert!(bands.lower.iter().all(Option::is_none));
        }

        #[test]
        fn rsi_is_bounded(
            closes in proptest::collection::vec(1.0f64..500.0, 2..80),
            period in 1usize..20,
        ) {
            for value in rsi(&closes, period).into_iter().flatten() {
                prop_assert!((0.0..=100.0).contains(&value));
            }
        }

        #[test]
        fn moving_average_prefix_length(
            closes in proptest::collection::vec(1.0f64..500.0, 1..60),
            window in 1usize..30,
        ) {
            let values = moving_average(&closes, window);
            prop_assert_eq!(values.len(), closes.len());
            let undefined = values.iter().take_while(|v| v.is_none()).count();
            prop_assert_eq!(undefined, (window - 1).min(closes.len()));
        }
    }
}
