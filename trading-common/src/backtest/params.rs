// trading-common/src/backtest/params.rs

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategies the engine knows how to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    MaRsiCombo,
    BollingerRsi,
    PairsZscore,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::MaRsiCombo,
        StrategyKind::BollingerRsi,
        StrategyKind::PairsZscore,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::MaRsiCombo => "ma_rsi_combo",
            StrategyKind::BollingerRsi => "bollinger_rsi",
            StrategyKind::PairsZscore => "pairs_zscore",
        }
    }

    /// Pairs evaluation consumes two series instead of one
    pub fn is_pair(&self) -> bool {
        matches!(self, StrategyKind::PairsZscore)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StrategyKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s.trim())
            .ok_or_else(|| EngineError::invalid(format!("unknown strategy: {}", s)))
    }
}

/// How the moving-average condition of `ma_rsi_combo` is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMode {
    /// Relationship of the averages on the previous bar only
    #[default]
    PreviousBar,
    /// Fast average must actually cross the slow one between i-1 and i
    CrossEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaRsiParams {
    #[serde(alias = "fast_ma")]
    pub fast_window: usize,
    #[serde(alias = "slow_ma")]
    pub slow_window: usize,
    pub rsi_period: usize,
    #[serde(alias = "rsi_buy")]
    pub rsi_buy_threshold: f64,
    #[serde(alias = "rsi_sell")]
    pub rsi_sell_threshold: f64,
    pub crossover: CrossoverMode,
}

impl Default for MaRsiParams {
    fn default() -> Self {
        Self {
            fast_window: 5,
            slow_window: 20,
            rsi_period: 14,
            rsi_buy_threshold: 30.0,
            rsi_sell_threshold: 70.0,
            crossover: CrossoverMode::PreviousBar,
        }
    }
}

impl MaRsiParams {
    pub fn validate(&self) -> EngineResult<()> {
        positive("ma_rsi_combo.fast_window", self.fast_window)?;
        positive("ma_rsi_combo.slow_window", self.slow_window)?;
        positive("ma_rsi_combo.rsi_period", self.rsi_period)?;
        rsi_level("ma_rsi_combo.rsi_buy_threshold", self.rsi_buy_threshold)?;
        rsi_level("ma_rsi_combo.rsi_sell_threshold", self.rsi_sell_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerRsiParams {
    #[serde(alias = "bollinger_window")]
    pub window: usize,
    #[serde(alias = "bollinger_std_dev")]
    pub std_dev_multiplier: f64,
    #[serde(alias = "bollinger_rsi_thresh")]
    pub rsi_threshold: f64,
    pub rsi_period: usize,
}

impl Default for BollingerRsiParams {
    fn default() -> Self {
        Self {
            window: 20,
            std_dev_multiplier: 2.0,
            rsi_threshold: 35.0,
            rsi_period: 14,
        }
    }
}

impl BollingerRsiParams {
    pub fn validate(&self) -> EngineResult<()> {
        // A single-bar window has no sample deviation.
        if self.window < 2 {
            return Err(EngineError::invalid(format!(
                "bollinger_rsi.window must be at least 2, got {}",
                self.window
            )));
        }
        positive("bollinger_rsi.rsi_period", self.rsi_period)?;
        if !(self.std_dev_multiplier.is_finite() && self.std_dev_multiplier > 0.0) {
            return Err(EngineError::invalid(format!(
                "bollinger_rsi.std_dev_multiplier must be positive, got {}",
                self.std_dev_multiplier
            )));
        }
        rsi_level("bollinger_rsi.rsi_threshold", self.rsi_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairsParams {
    #[serde(alias = "symbols")]
    pub symbol_pair: (String, String),
    #[serde(alias = "lookback_days")]
    pub lookback_window: usize,
    pub entry_zscore: f64,
    pub exit_zscore: f64,
}

impl Default for PairsParams {
    fn default() -> Self {
        Self {
            symbol_pair: ("AAPL".to_string(), "MSFT".to_string()),
            lookback_window: 15,
            entry_zscore: 2.0,
            exit_zscore: 0.5,
        }
    }
}

impl PairsParams {
    pub fn validate(&self) -> EngineResult<()> {
        let (first, second) = &self.symbol_pair;
        if first.trim().is_empty() || second.trim().is_empty() {
            return Err(EngineError::invalid("pairs_zscore.symbol_pair needs two symbols"));
        }
        if first.eq_ignore_ascii_case(second) {
            return Err(EngineError::invalid(format!(
                "pairs_zscore.symbol_pair must name two different symbols, got {} twice",
                first
            )));
        }
        if self.lookback_window < 2 {
            return Err(EngineError::invalid(format!(
                "pairs_zscore.lookback_window must be at least 2, got {}",
                self.lookback_window
            )));
        }
        if !(self.entry_zscore.is_finite() && self.entry_zscore > 0.0) {
            return Err(EngineError::invalid(format!(
                "pairs_zscore.entry_zscore must be positive, got {}",
                self.entry_zscore
            )));
        }
        if !(self.exit_zscore.is_finite() && self.exit_zscore >= 0.0) {
            return Err(EngineError::invalid(format!(
                "pairs_zscore.exit_zscore must be non-negative, got {}",
                self.exit_zscore
            )));
        }
        // Otherwise |z| < exit could never be reached once in a position.
        if self.exit_zscore >= self.entry_zscore {
            return Err(EngineError::invalid(format!(
                "pairs_zscore.exit_zscore ({}) must be below entry_zscore ({})",
                self.exit_zscore, self.entry_zscore
            )));
        }
        Ok(())
    }
}

/// Immutable parameter snapshot for one evaluation run.
///
/// Serialized keyed by strategy name. The flat legacy settings layout
/// (`fast_ma`, `rsi_buy`, `pairs.symbols`, ...) is accepted on input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ParameterFile")]
pub struct StrategyParameters {
    pub strategy: StrategyKind,
    pub ma_rsi_combo: MaRsiParams,
    pub bollinger_rsi: BollingerRsiParams,
    pub pairs_zscore: PairsParams,
}

impl StrategyParameters {
    /// Validate every section, not just the active one, so a bad file is
    /// rejected at load time whatever strategy is selected.
    pub fn validate(&self) -> EngineResult<()> {
        self.ma_rsi_combo.validate()?;
        self.bollinger_rsi.validate()?;
        self.pairs_zscore.validate()
    }

    pub fn validated(self) -> EngineResult<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ParameterFile {
    strategy: StrategyKind,
    ma_rsi_combo: Option<MaRsiParams>,
    bollinger_rsi: Option<BollingerRsiParams>,
    pairs_zscore: Option<PairsParams>,
    #[serde(flatten)]
    legacy: LegacySettings,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LegacySettings {
    fast_ma: Option<usize>,
    slow_ma: Option<usize>,
    rsi_period: Option<usize>,
    rsi_buy: Option<f64>,
    rsi_sell: Option<f64>,
    bollinger_window: Option<usize>,
    bollinger_std_dev: Option<f64>,
    bollinger_rsi_thresh: Option<f64>,
    pairs: Option<PairsParams>,
}

impl From<ParameterFile> for StrategyParameters {
    fn from(file: ParameterFile) -> Self {
        let legacy = file.legacy;

        let ma_rsi_combo = file.ma_rsi_combo.unwrap_or_else(|| {
            let d = MaRsiParams::default();
            MaRsiParams {
                fast_window: legacy.fast_ma.unwrap_or(d.fast_window),
                slow_window: legacy.slow_ma.unwrap_or(d.slow_window),
                rsi_period: legacy.rsi_period.unwrap_or(d.rsi_period),
                rsi_buy_threshold: legacy.rsi_buy.unwrap_or(d.rsi_buy_threshold),
                rsi_sell_threshold: legacy.rsi_sell.unwrap_or(d.rsi_sell_threshold),
                crossover: d.crossover,
            }
        });

        let bollinger_rsi = file.bollinger_rsi.unwrap_or_else(|| {
            let d = BollingerRsiParams::default();
            BollingerRsiParams {
                window: legacy.bollinger_window.unwrap_or(d.window),
                std_dev_multiplier: legacy.bollinger_std_dev.unwrap_or(d.std_dev_multiplier),
                rsi_threshold: legacy.bollinger_rsi_thresh.unwrap_or(d.rsi_threshold),
                rsi_period: legacy.rsi_period.unwrap_or(d.rsi_period),
            }
        });

        let pairs_zscore = file.pairs_zscore.or(legacy.pairs).unwrap_or_default();

        Self {
            strategy: file.strategy,
            ma_rsi_combo,
            bollinger_rsi,
            pairs_zscore,
        }
    }
}

fn positive(name: &str, value: usize) -> EngineResult<()> {
    if value == 0 {
        return Err(EngineError::invalid(format!("{} must be positive", name)));
    }
    Ok(())
}

fn rsi_level(name: &str, value: f64) -> EngineResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(EngineError::invalid(format!(
            "{} must lie within [0, 100], got {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = StrategyParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.strategy, StrategyKind::MaRsiCombo);
        assert_eq!(params.ma_rsi_combo.fast_window, 5);
        assert_eq!(params.bollinger_rsi.rsi_threshold, 35.0);
        assert_eq!(params.pairs_zscore.lookback_window, 15);
    }

    #[test]
    fn test_exit_above_entry_fails_validation() {
        let mut params = StrategyParameters::default();
        params.pairs_zscore.entry_zscore = 2.0;
        params.pairs_zscore.exit_zscore = 3.0;
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_exit_equal_to_entry_fails_validation() {
        let pairs = PairsParams {
            entry_zscore: 1.5,
            exit_zscore: 1.5,
            ..PairsParams::default()
        };
        assert!(pairs.validate().is_err());
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let ma = MaRsiParams {
            fast_window: 0,
            ..MaRsiParams::default()
        };
        assert!(ma.validate().is_err());

        let bb = BollingerRsiParams {
            window: 1,
            ..BollingerRsiParams::default()
        };
        assert!(bb.validate().is_err());
    }

    #[test]
    fn test_window_and_threshold_order_is_not_enforced() {
        let ma = MaRsiParams {
            fast_window: 20,
            slow_window: 20,
            rsi_buy_threshold: 50.0,
            rsi_sell_threshold: 50.0,
            ..MaRsiParams::default()
        };
        assert!(ma.validate().is_ok());

        let inverted = MaRsiParams {
            fast_window: 15,
            slow_window: 10,
            rsi_buy_threshold: 60.0,
            rsi_sell_threshold: 40.0,
            ..MaRsiParams::default()
        };
        assert!(inverted.validate().is_ok());
    }

    #[test]
    fn test_legacy_inverted_windows_are_loaded() {
        let json = r#"{ "fast_ma": 15, "slow_ma": 10, "rsi_buy": 50, "rsi_sell": 50 }"#;
        let params: StrategyParameters = serde_json::from_str(json).unwrap();

        assert_eq!(params.ma_rsi_combo.fast_window, 15);
        assert_eq!(params.ma_rsi_combo.slow_window, 10);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let json = r#"{ "strategy": "bollinger_rsi", "ma_rsi_combo": { "fast_window": 3 } }"#;
        let params: StrategyParameters = serde_json::from_str(json).unwrap();

        assert_eq!(params.strategy, StrategyKind::BollingerRsi);
        assert_eq!(params.ma_rsi_combo.fast_window, 3);
        assert_eq!(params.ma_rsi_combo.slow_window, 20);
        assert_eq!(params.bollinger_rsi, BollingerRsiParams::default());
    }

    #[test]
    fn test_legacy_flat_layout_is_accepted() {
        let json = r#"{
            "strategy": "pairs_zscore",
            "fast_ma": 8,
            "slow_ma": 30,
            "rsi_period": 10,
            "rsi_buy": 25,
            "bollinger_window": 18,
            "bollinger_std_dev": 3,
            "bollinger_rsi_thresh": 40,
            "pairs": { "symbols": ["KO", "PEP"], "lookback_days": 20, "entry_zscore": 2.5, "exit_zscore": 0.4 }
        }"#;
        let params: StrategyParameters = serde_json::from_str(json).unwrap();

        assert_eq!(params.strategy, StrategyKind::PairsZscore);
        assert_eq!(params.ma_rsi_combo.fast_window, 8);
        assert_eq!(params.ma_rsi_combo.slow_window, 30);
        assert_eq!(params.ma_rsi_combo.rsi_period, 10);
        assert_eq!(params.ma_rsi_combo.rsi_buy_threshold, 25.0);
        assert_eq!(params.ma_rsi_combo.rsi_sell_threshold, 70.0);
        assert_eq!(params.bollinger_rsi.window, 18);
        assert_eq!(params.bollinger_rsi.std_dev_multiplier, 3.0);
        assert_eq!(params.bollinger_rsi.rsi_period, 10);
        assert_eq!(
            params.pairs_zscore.symbol_pair,
            ("KO".to_string(), "PEP".to_string())
        );
        assert_eq!(params.pairs_zscore.lookback_window, 20);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_roundtrip_keeps_sections() {
        let mut params = StrategyParameters::default().with_strategy(StrategyKind::BollingerRsi);
        params.ma_rsi_combo.crossover = CrossoverMode::CrossEvent;
        let json = serde_json::to_string(&params).unwrap();
        let back: StrategyParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!(
            "pairs_zscore".parse::<StrategyKind>().unwrap(),
            StrategyKind::PairsZscore
        );
        assert!("macd".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::BollingerRsi.to_string(), "bollinger_rsi");
    }
}
