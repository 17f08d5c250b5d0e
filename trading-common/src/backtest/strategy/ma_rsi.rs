// trading-common/src/backtest/strategy/ma_rsi.rs

use super::base::{Signal, Strategy};
use crate::backtest::indicators::IndicatorFrame;
use crate::backtest::params::{CrossoverMode, MaRsiParams, StrategyKind};
use crate::data::PriceSeries;
use std::collections::HashMap;

/// Moving-average trend filter combined with an RSI trigger
#[derive(Debug, Clone)]
pub struct MaRsiCombo {
    params: MaRsiParams,
}

impl MaRsiCombo {
    pub fn new(params: MaRsiParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MaRsiParams {
        &self.params
    }

    fn previous_bar(&self, fast_prev: f64, slow_prev: f64, rsi: f64) -> Signal {
        if fast_prev > slow_prev && rsi < self.params.rsi_buy_threshold {
            Signal::Buy
        } else if fast_prev < slow_prev && rsi > self.params.rsi_sell_threshold {
            Signal::Sell
        } else {
            Signal::NoSignal
        }
    }

    fn cross_event(&self, prev: (f64, f64), now: (f64, f64), rsi: f64) -> Signal {
        let crossed_up = prev.0 < prev.1 && now.0 > now.1;
        let crossed_down = prev.0 > prev.1 && now.0 < now.1;

        if crossed_up && rsi < self.params.rsi_buy_threshold {
            Signal::Buy
        } else if crossed_down || rsi > self.params.rsi_sell_threshold {
            Signal::Sell
        } else {
            Signal::NoSignal
        }
    }
}

impl Strategy for MaRsiCombo {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MaRsiCombo
    }

    fn name(&self) -> &str {
        "MA + RSI Combo"
    }

    fn required_bars(&self) -> usize {
        // Both averages must be defined on the previous bar.
        let longest = self.params.slow_window.max(self.params.fast_window);
        (longest + 1).max(self.params.rsi_period + 1)
    }

    fn indicators(&self, series: &PriceSeries) -> IndicatorFrame {
        IndicatorFrame::new(series)
            .with_moving_averages(self.params.fast_window, self.params.slow_window)
            .with_rsi(self.params.rsi_period)
    }

    fn evaluate(&self, frame: &IndicatorFrame, index: usize) -> Signal {
        if index == 0 {
            return Signal::NoSignal;
        }
        let prev = index - 1;

        let (Some(fast_prev), Some(slow_prev), Some(rsi)) = (
            IndicatorFrame::value(&frame.fast_ma, prev),
            IndicatorFrame::value(&frame.slow_ma, prev),
            IndicatorFrame::value(&frame.rsi, index),
        ) else {
            return Signal::NoSignal;
        };

        match self.params.crossover {
            CrossoverMode::PreviousBar => self.previous_bar(fast_prev, slow_prev, rsi),
            CrossoverMode::CrossEvent => {
                let (Some(fast), Some(slow)) = (
                    IndicatorFrame::value(&frame.fast_ma, index),
                    IndicatorFrame::value(&frame.slow_ma, index),
                ) else {
                    return Signal::NoSignal;
                };
                self.cross_event((fast_prev, slow_prev), (fast, slow), rsi)
            }
        }
    }

    fn parameters(&self) -> HashMap<String, String> {
        let mut parameters = HashMap::new();
        parameters.insert("fast_window".to_string(), self.params.fast_window.to_string());
        parameters.insert("slow_window".to_string(), self.params.slow_window.to_string());
        parameters.insert("rsi_period".to_string(), self.params.rsi_period.to_string());
        parameters.insert(
            "rsi_buy_threshold".to_string(),
            self.params.rsi_buy_threshold.to_string(),
        );
        parameters.insert(
            "rsi_sell_threshold".to_string(),
            self.params.rsi_sell_threshold.to_string(),
        );
        parameters.insert(
            "crossover".to_string(),
            format!("{:?}", self.params.crossover),
        );
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Hand-built frame so each condition can be pinned down exactly.
    fn frame(fast: &[Option<f64>], slow: &[Option<f64>], rsi: &[Option<f64>]) -> IndicatorFrame {
        let n = fast.len();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap();
        IndicatorFrame {
            timestamps: (0..n)
                .map(|i| start + chrono::Duration::minutes(15 * i as i64))
                .collect(),
            close: vec![100.0; n],
            fast_ma: fast.to_vec(),
            slow_ma: slow.to_vec(),
            rsi: rsi.to_vec(),
            bb_middle: vec![None; n],
            bb_upper: vec![None; n],
            bb_lower: vec![None; n],
            zscore: vec![None; n],
        }
    }

    fn strategy(crossover: CrossoverMode) -> MaRsiCombo {
        MaRsiCombo::new(MaRsiParams {
            crossover,
            ..MaRsiParams::default()
        })
    }

    #[test]
    fn test_buy_uses_previous_bar_trend_and_current_rsi() {
        let f = frame(
            &[Some(11.0), Some(9.0)],
            &[Some(10.0), Some(10.0)],
            &[Some(80.0), Some(25.0)],
        );
        // Previous bar trend is up even though the current bar's is down.
        assert_eq!(strategy(CrossoverMode::PreviousBar).evaluate(&f, 1), Signal::Buy);
    }

    #[test]
    fn test_sell_on_downtrend_and_high_rsi() {
        let f = frame(
            &[Some(9.0), Some(9.0)],
            &[Some(10.0), Some(10.0)],
            &[None, Some(75.0)],
        );
        assert_eq!(strategy(CrossoverMode::PreviousBar).evaluate(&f, 1), Signal::Sell);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let f = frame(
            &[Some(11.0), Some(11.0)],
            &[Some(10.0), Some(10.0)],
            &[Some(30.0), Some(30.0)],
        );
        assert_eq!(
            strategy(CrossoverMode::PreviousBar).evaluate(&f, 1),
            Signal::NoSignal
        );
    }

    #[test]
    fn test_undefined_values_never_signal() {
        let f = frame(&[None, Some(11.0)], &[None, Some(10.0)], &[None, Some(1.0)]);
        let s = strategy(CrossoverMode::PreviousBar);
        assert_eq!(s.evaluate(&f, 0), Signal::NoSignal);
        assert_eq!(s.evaluate(&f, 1), Signal::NoSignal);
    }

    #[test]
    fn test_cross_event_requires_actual_cross() {
        let s = strategy(CrossoverMode::CrossEvent);

        let no_cross = frame(
            &[Some(11.0), Some(12.0)],
            &[Some(10.0), Some(10.0)],
            &[Some(20.0), Some(20.0)],
        );
        assert_eq!(s.evaluate(&no_cross, 1), Signal::NoSignal);

        let cross_up = frame(
            &[Some(9.0), Some(11.0)],
            &[Some(10.0), Some(10.0)],
            &[Some(20.0), Some(20.0)],
        );
        assert_eq!(s.evaluate(&cross_up, 1), Signal::Buy);
    }

    #[test]
    fn test_cross_event_sells_on_cross_down_or_overbought() {
        let s = strategy(CrossoverMode::CrossEvent);

        let cross_down = frame(
            &[Some(11.0), Some(9.0)],
            &[Some(10.0), Some(10.0)],
            &[Some(50.0), Some(50.0)],
        );
        assert_eq!(s.evaluate(&cross_down, 1), Signal::Sell);

        let overbought = frame(
            &[Some(11.0), Some(12.0)],
            &[Some(10.0), Some(10.0)],
            &[Some(50.0), Some(90.0)],
        );
        assert_eq!(s.evaluate(&overbought, 1), Signal::Sell);
    }

    #[test]
    fn test_required_bars() {
        let s = MaRsiCombo::new(MaRsiParams::default());
        assert_eq!(s.required_bars(), 21);
        assert!(s.check_history(20).is_err());
        assert!(s.check_history(21).is_ok());

        let inverted = MaRsiCombo::new(MaRsiParams {
            fast_window: 15,
            slow_window: 10,
            rsi_period: 5,
            ..MaRsiParams::default()
        });
        assert_eq!(inverted.required_bars(), 16);
    }
}
