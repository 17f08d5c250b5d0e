// trading-common/src/backtest/engine.rs

use super::events::EngineEvent;
use super::indicators::IndicatorFrame;
use super::metrics::{MetricsCalculator, PerformanceSummary, RoundTrip};
use super::params::StrategyKind;
use super::portfolio::{PairPosition, Position, PositionTracker, Transition};
use super::strategy::{PairsZscore, Signal, Strategy};
use super::types::Trade;
use crate::data::{align_pair, PriceSeries};
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalPoint {
    pub timestamp: DateTime<Utc>,
    pub signal: Signal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub parameters: HashMap<String, String>,
    pub signals: Vec<SignalPoint>,
    pub trades: Vec<Trade>,
    pub events: Vec<EngineEvent>,
    pub round_trips: Vec<RoundTrip>,
    pub metrics: PerformanceSummary,
    /// State after the last bar; an open position is not force-closed
    pub open_position: Position,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiBacktestResult {
    pub strategy: StrategyKind,
    pub results: Vec<BacktestResult>,
    pub skipped: Vec<SkippedSymbol>,
    pub combined: PerformanceSummary,
    pub by_symbol: BTreeMap<String, PerformanceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairBacktestResult {
    pub symbols: (String, String),
    pub parameters: HashMap<String, String>,
    pub signals: Vec<SignalPoint>,
    pub trades: Vec<Trade>,
    pub events: Vec<EngineEvent>,
    /// Net P/L of each closed pair, in close order
    pub pair_profits: Vec<Decimal>,
    pub net_pair_return: Decimal,
    /// Leg-level statistics
    pub metrics: PerformanceSummary,
    pub by_symbol: BTreeMap<String, PerformanceSummary>,
    pub open_position: PairPosition,
}

/// Replays price history through a strategy and the position tracker.
///
/// Runs are deterministic and share no state: the same inputs always give
/// the same signals, trades and metrics.
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    metrics_calculator: MetricsCalculator,
}

impl BacktestEngine {
    pub fn new() -> Self {
        Self {
            metrics_calculator: MetricsCalculator::new(),
        }
    }

    pub fn run(&self, series: &PriceSeries, strategy: &dyn Strategy) -> EngineResult<BacktestResult> {
        info!(
            "Starting backtest for symbol: {} ({})",
            series.symbol(),
            strategy.name()
        );
        strategy.check_history(series.len())?;

        let frame = strategy.indicators(series);
        let mut tracker = PositionTracker::new();
        let mut signals = Vec::with_capacity(series.len());
        let mut events = Vec::new();

        for (index, bar) in series.bars().iter().enumerate() {
            let signal = strategy.evaluate(&frame, index);
            if signal.is_actionable() {
                debug!("{} {} at {}", series.symbol(), signal, bar.timestamp);
                events.push(EngineEvent::SignalComputed {
                    symbol: series.symbol().to_string(),
                    timestamp: bar.timestamp,
                    signal: signal.clone(),
                });
            }

            let transition = tracker.on_bar(series.symbol(), bar, &signal)?;
            events.extend(EngineEvent::from_transition(&transition));
            signals.push(SignalPoint {
                timestamp: bar.timestamp,
                signal,
            });
        }

        let open_position = tracker.position(series.symbol());
        let trades = tracker.into_trades();
        let round_trips = self.metrics_calculator.round_trips(&trades);
        let metrics = self.metrics_calculator.summarize(&round_trips);

        info!(
            "Backtest completed for {}: {} trades, net return {}",
            series.symbol(),
            trades.len(),
            metrics.net_return
        );

        Ok(BacktestResult {
            symbol: series.symbol().to_string(),
            strategy: strategy.kind(),
            parameters: strategy.parameters(),
            signals,
            trades,
            events,
            round_trips,
            metrics,
            open_position,
        })
    }

    /// Runs every series independently. A symbol with too little history is
    /// skipped and reported; any other error aborts the whole run.
    pub fn run_many(
        &self,
        series: &[PriceSeries],
        strategy: &dyn Strategy,
    ) -> EngineResult<MultiBacktestResult> {
        let mut results = Vec::new();
        let mut skipped = Vec::new();

        for s in series {
            match self.run(s, strategy) {
                Ok(result) => results.push(result),
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping {}: {}", s.symbol(), e);
                    skipped.push(SkippedSymbol {
                        symbol: s.symbol().to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let all_trades: Vec<Trade> = results.iter().flat_map(|r| r.trades.clone()).collect();
        Ok(MultiBacktestResult {
            strategy: strategy.kind(),
            combined: self.metrics_calculator.calculate(&all_trades),
            by_symbol: self.metrics_calculator.calculate_by_symbol(&all_trades),
            results,
            skipped,
        })
    }

    pub fn run_pair(
        &self,
        first: &PriceSeries,
        second: &PriceSeries,
        strategy: &PairsZscore,
    ) -> EngineResult<PairBacktestResult> {
        info!(
            "Starting pairs backtest for {}/{}",
            first.symbol(),
            second.symbol()
        );
        check_pair_symbols(first, second, strategy)?;
        if first.is_empty() || second.is_empty() {
            return Err(EngineError::InsufficientData {
                required: strategy.required_bars(),
                available: 0,
            });
        }

        let pair = align_pair(first, second)?;
        strategy.check_history(pair.len())?;

        let frame = strategy.indicators(&pair);
        let stream = strategy.scan(&frame.zscore);

        let mut tracker = PositionTracker::new();
        let mut signals = Vec::with_capacity(pair.len());
        let mut events = Vec::new();
        let mut pair_profits = Vec::new();

        let bars = pair.first.bars().iter().zip(pair.second.bars());
        for ((a, b), signal) in bars.zip(stream) {
            if signal.is_actionable() {
                events.push(EngineEvent::SignalComputed {
                    symbol: format!("{}/{}", first.symbol(), second.symbol()),
                    timestamp: a.timestamp,
                    signal: signal.clone(),
                });
            }

            let transition =
                tracker.on_pair_bar((first.symbol(), a), (second.symbol(), b), &signal)?;
            if let Transition::PairClosed { net_profit, .. } = &transition {
                pair_profits.push(*net_profit);
            }
            events.extend(EngineEvent::from_transition(&transition));
            signals.push(SignalPoint {
                timestamp: a.timestamp,
                signal,
            });
        }

        let open_position = tracker.pair_position(first.symbol(), second.symbol());
        let trades = tracker.into_trades();
        let net_pair_return: Decimal = pair_profits.iter().sum();

        info!(
            "Pairs backtest completed: {} pairs closed, net return {}",
            pair_profits.len(),
            net_pair_return
        );

        Ok(PairBacktestResult {
            symbols: (first.symbol().to_string(), second.symbol().to_string()),
            parameters: strategy.parameters(),
            signals,
            metrics: self.metrics_calculator.calculate(&trades),
            by_symbol: self.metrics_calculator.calculate_by_symbol(&trades),
            trades,
            events,
            pair_profits,
            net_pair_return,
            open_position,
        })
    }

    /// Signal for the most recent bar only, as a live caller sees it.
    pub fn latest_signal(&self, series: &PriceSeries, strategy: &dyn Strategy) -> EngineResult<Signal> {
        strategy.check_history(series.len())?;
        let frame = strategy.indicators(series);
        let last = last_index(&frame, strategy.required_bars())?;
        Ok(strategy.evaluate(&frame, last))
    }

    /// Raw pairs signal for the most recent aligned bar. Without a position
    /// history an exit reading is reported as-is; callers decide what it means.
    pub fn latest_pair_signal(
        &self,
        first: &PriceSeries,
        second: &PriceSeries,
        strategy: &PairsZscore,
    ) -> EngineResult<Signal> {
        check_pair_symbols(first, second, strategy)?;
        if first.is_empty() || second.is_empty() {
            return Err(EngineError::InsufficientData {
                required: strategy.required_bars().max(1),
                available: 0,
            });
        }
        let pair = align_pair(first, second)?;
        strategy.check_history(pair.len())?;

        let frame = strategy.indicators(&pair);
        let last = last_index(&frame, strategy.required_bars())?;
        Ok(strategy.evaluate(&frame, last))
    }
}

fn last_index(frame: &IndicatorFrame, required: usize) -> EngineResult<usize> {
    frame
        .len()
        .checked_sub(1)
        .ok_or(EngineError::InsufficientData {
            required: required.max(1),
            available: 0,
        })
}

fn check_pair_symbols(
    first: &PriceSeries,
    second: &PriceSeries,
    strategy: &PairsZscore,
) -> EngineResult<()> {
    if !first.symbol().eq_ignore_ascii_case(strategy.first_symbol())
        || !second.symbol().eq_ignore_ascii_case(strategy.second_symbol())
    {
        return Err(EngineError::SeriesMismatch(format!(
            "series {}/{} do not match configured pair {}/{}",
            first.symbol(),
            second.symbol(),
            strategy.first_symbol(),
            strategy.second_symbol()
        )));
    }
    Ok(())
}
