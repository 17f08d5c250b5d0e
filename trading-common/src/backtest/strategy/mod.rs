pub(crate) mod base;
mod bollinger;
mod ma_rsi;
mod pairs;

pub use base::{PairLeg, Signal, Strategy};
pub use bollinger::BollingerRsi;
pub use ma_rsi::MaRsiCombo;
pub use pairs::PairsZscore;

use crate::backtest::params::{StrategyKind, StrategyParameters};
use crate::error::{EngineError, EngineResult};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StrategyInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Build a single-series evaluator from a validated parameter snapshot.
pub fn create_strategy(
    kind: StrategyKind,
    params: &StrategyParameters,
) -> EngineResult<Box<dyn Strategy>> {
    match kind {
        StrategyKind::MaRsiCombo => {
            params.ma_rsi_combo.validate()?;
            Ok(Box::new(MaRsiCombo::new(params.ma_rsi_combo.clone())))
        }
        StrategyKind::BollingerRsi => {
            params.bollinger_rsi.validate()?;
            Ok(Box::new(BollingerRsi::new(params.bollinger_rsi.clone())))
        }
        StrategyKind::PairsZscore => Err(EngineError::InvalidParameters(
            "pairs_zscore evaluates two series; use PairsZscore directly".to_string(),
        )),
    }
}

pub fn create_pair_strategy(params: &StrategyParameters) -> EngineResult<PairsZscore> {
    PairsZscore::new(params.pairs_zscore.clone())
}

pub fn list_strategies() -> Vec<StrategyInfo> {
    vec![
        StrategyInfo {
            id: StrategyKind::MaRsiCombo.id().to_string(),
            name: "MA + RSI Combo".to_string(),
            description: "Buys oversold RSI in an uptrend and sells overbought RSI in a downtrend, \
                          using the fast/slow moving average relationship as the trend filter"
                .to_string(),
        },
        StrategyInfo {
            id: StrategyKind::BollingerRsi.id().to_string(),
            name: "Bollinger Bands + RSI".to_string(),
            description: "Buys closes below the lower band with low RSI and sells closes above \
                          the upper band with high RSI"
                .to_string(),
        },
        StrategyInfo {
            id: StrategyKind::PairsZscore.id().to_string(),
            name: "Pairs Trading Z-Score".to_string(),
            description: "Trades the spread between two symbols when its rolling z-score leaves \
                          the entry band and closes both legs once it reverts"
                .to_string(),
        },
    ]
}

pub fn get_strategy_info(strategy_id: &str) -> Option<StrategyInfo> {
    list_strategies()
        .into_iter()
        .find(|info| info.id == strategy_id)
}
