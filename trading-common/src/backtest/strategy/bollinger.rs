// trading-common/src/backtest/strategy/bollinger.rs

use super::base::{Signal, Strategy};
use crate::backtest::indicators::IndicatorFrame;
use crate::backtest::params::{BollingerRsiParams, StrategyKind};
use crate::data::PriceSeries;
use std::collections::HashMap;

/// Band breakout confirmed by an RSI extreme, all on the current bar
#[derive(Debug, Clone)]
pub struct BollingerRsi {
    params: BollingerRsiParams,
}

impl BollingerRsi {
    pub fn new(params: BollingerRsiParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BollingerRsiParams {
        &self.params
    }
}

impl Strategy for BollingerRsi {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BollingerRsi
    }

    fn name(&self) -> &str {
        "Bollinger Bands + RSI"
    }

    fn required_bars(&self) -> usize {
        self.params.window.max(self.params.rsi_period + 1)
    }

    fn indicators(&self, series: &PriceSeries) -> IndicatorFrame {
        IndicatorFrame::new(series)
            .with_bollinger(self.params.window, self.params.std_dev_multiplier)
            .with_rsi(self.params.rsi_period)
    }

    fn evaluate(&self, frame: &IndicatorFrame, index: usize) -> Signal {
        let (Some(close), Some(upper), Some(lower), Some(rsi)) = (
            frame.close_at(index),
            IndicatorFrame::value(&frame.bb_upper, index),
            IndicatorFrame::value(&frame.bb_lower, index),
            IndicatorFrame::value(&frame.rsi, index),
        ) else {
            return Signal::NoSignal;
        };

        let threshold = self.params.rsi_threshold;
        if close < lower && rsi < threshold {
            Signal::Buy
        } else if close > upper && rsi > 100.0 - threshold {
            Signal::Sell
        } else {
            Signal::NoSignal
        }
    }

    fn parameters(&self) -> HashMap<String, String> {
        let mut parameters = HashMap::new();
        parameters.insert("window".to_string(), self.params.window.to_string());
        parameters.insert(
            "std_dev_multiplier".to_string(),
            self.params.std_dev_multiplier.to_string(),
        );
        parameters.insert(
            "rsi_threshold".to_string(),
            self.params.rsi_threshold.to_string(),
        );
        parameters.insert("rsi_period".to_string(), self.params.rsi_period.to_string());
        parameters
    }
}
