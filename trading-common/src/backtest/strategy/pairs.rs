// trading-common/src/backtest/strategy/pairs.rs

use super::base::{PairLeg, Signal};
use crate::backtest::indicators::IndicatorFrame;
use crate::backtest::params::{PairsParams, StrategyKind};
use crate::backtest::types::TradeAction;
use crate::data::AlignedPair;
use crate::error::{EngineError, EngineResult};
use std::collections::HashMap;

/// Mean reversion on the spread between two related symbols.
///
/// Not a [`super::Strategy`]: it needs two aligned series.
#[derive(Debug, Clone)]
pub struct PairsZscore {
    params: PairsParams,
}

impl PairsZscore {
    /// Fails with `InvalidParameters` when the thresholds make exit unreachable.
    pub fn new(params: PairsParams) -> EngineResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn kind(&self) -> StrategyKind {
        StrategyKind::PairsZscore
    }

    pub fn name(&self) -> &str {
        "Pairs Trading Z-Score"
    }

    pub fn params(&self) -> &PairsParams {
        &self.params
    }

    pub fn first_symbol(&self) -> &str {
        &self.params.symbol_pair.0
    }

    pub fn second_symbol(&self) -> &str {
        &self.params.symbol_pair.1
    }

    pub fn required_bars(&self) -> usize {
        self.params.lookback_window
    }

    pub fn check_history(&self, available: usize) -> EngineResult<()> {
        let required = self.required_bars().max(1);
        if available < required {
            return Err(EngineError::InsufficientData {
                required,
                available,
            });
        }
        Ok(())
    }

    pub fn indicators(&self, pair: &AlignedPair) -> IndicatorFrame {
        IndicatorFrame::for_pair(pair, self.params.lookback_window)
    }

    pub fn evaluate(&self, frame: &IndicatorFrame, index: usize) -> Signal {
        self.signal_for(IndicatorFrame::value(&frame.zscore, index))
    }

    /// Map the current spread z-score to a signal. Entry wins over exit
    /// because the thresholds cannot overlap.
    pub fn signal_for(&self, zscore: Option<f64>) -> Signal {
        let Some(z) = zscore.filter(|z| z.is_finite()) else {
            return Signal::NoSignal;
        };

        if z > self.params.entry_zscore {
            self.entry(TradeAction::Sell, TradeAction::Buy)
        } else if z < -self.params.entry_zscore {
            self.entry(TradeAction::Buy, TradeAction::Sell)
        } else if z.abs() < self.params.exit_zscore {
            Signal::ExitPair
        } else {
            Signal::NoSignal
        }
    }

    /// Signal stream over a z-score series. An exit is only emitted while a
    /// pair opened earlier in the same stream is still open; otherwise the
    /// bar reads as `NoSignal`.
    pub fn scan(&self, zscores: &[Option<f64>]) -> Vec<Signal> {
        let mut open = false;
        zscores
            .iter()
            .map(|z| match self.signal_for(*z) {
                Signal::ExitPair if !open => Signal::NoSignal,
                Signal::ExitPair => {
                    open = false;
                    Signal::ExitPair
                }
                entry @ Signal::EnterPair { .. } => {
                    open = true;
                    entry
                }
                other => other,
            })
            .collect()
    }

    fn entry(&self, first: TradeAction, second: TradeAction) -> Signal {
        Signal::EnterPair {
            first: PairLeg {
                symbol: self.params.symbol_pair.0.clone(),
                action: first,
            },
            second: PairLeg {
                symbol: self.params.symbol_pair.1.clone(),
                action: second,
            },
        }
    }

    pub fn parameters(&self) -> HashMap<String, String> {
        let mut parameters = HashMap::new();
        parameters.insert(
            "symbol_pair".to_string(),
            format!("{}/{}", self.params.symbol_pair.0, self.params.symbol_pair.1),
        );
        parameters.insert(
            "lookback_window".to_string(),
            self.params.lookback_window.to_string(),
        );
        parameters.insert(
            "entry_zscore".to_string(),
            self.params.entry_zscore.to_string(),
        );
        parameters.insert("exit_zscore".to_string(), self.params.exit_zscore.to_string());
        parameters
    }
}
