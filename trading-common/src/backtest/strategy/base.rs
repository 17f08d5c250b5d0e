use crate::backtest::indicators::IndicatorFrame;
use crate::backtest::params::StrategyKind;
use crate::backtest::types::TradeAction;
use crate::data::PriceSeries;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One leg of a pairs entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairLeg {
    pub symbol: String,
    pub action: TradeAction,
}

/// Outcome of evaluating one bar. `NoSignal` is a real answer, distinct
/// from `EngineError::InsufficientData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    NoSignal,
    Buy,
    Sell,
    EnterPair { first: PairLeg, second: PairLeg },
    ExitPair,
}

impl Signal {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::NoSignal)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::NoSignal => f.write_str("none"),
            Signal::Buy => f.write_str("buy"),
            Signal::Sell => f.write_str("sell"),
            Signal::EnterPair { first, second } => write!(
                f,
                "enter pair ({} {}, {} {})",
                first.symbol, first.action, second.symbol, second.action
            ),
            Signal::ExitPair => f.write_str("exit pair"),
        }
    }
}

/// Single-series strategy evaluator.
///
/// `evaluate` may read bar `index` and `index - 1` of the frame and nothing
/// later, so a scan never sees the future.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;
    fn name(&self) -> &str;

    /// Minimum series length for the last bar to yield a defined evaluation
    fn required_bars(&self) -> usize;

    fn indicators(&self, series: &PriceSeries) -> IndicatorFrame;
    fn evaluate(&self, frame: &IndicatorFrame, index: usize) -> Signal;
    fn parameters(&self) -> HashMap<String, String>;

    /// At least one bar is always required.
    fn check_history(&self, available: usize) -> EngineResult<()> {
        let required = self.required_bars().max(1);
        if available < required {
            return Err(EngineError::InsufficientData {
                required,
                available,
            });
        }
        Ok(())
    }
}
