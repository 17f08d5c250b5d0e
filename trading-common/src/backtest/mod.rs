// trading-common/src/backtest/mod.rs

pub mod engine;
pub mod events;
pub mod indicators;
pub mod metrics;
pub mod params;
pub mod portfolio;
pub mod strategy;
pub mod types;

pub use engine::{
    BacktestEngine, BacktestResult, MultiBacktestResult, PairBacktestResult, SignalPoint,
    SkippedSymbol,
};
pub use events::EngineEvent;
pub use metrics::{MetricsCalculator, PerformanceSummary, RoundTrip};
pub use params::{
    BollingerRsiParams, CrossoverMode, MaRsiParams, PairsParams, StrategyKind, StrategyParameters,
};
pub use portfolio::{PairPosition, Position, PositionTracker, Transition};
pub use strategy::{
    create_pair_strategy, create_strategy, get_strategy_info, list_strategies, BollingerRsi,
    MaRsiCombo, PairLeg, PairsZscore, Signal, Strategy, StrategyInfo,
};
pub use types::{OrderIntent, PositionSide, Trade, TradeAction};
