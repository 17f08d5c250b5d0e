// trading-common/src/backtest/metrics.rs

use super::types::{PositionSide, Trade};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// A matched entry and exit for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    /// Sell price minus buy price
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    /// Percentage, 0 when there are no round-trips
    pub win_rate: Decimal,
    pub average_profit: Decimal,
    pub average_loss: Decimal,
    pub net_return: Decimal,

    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    /// Gross profit over absolute gross loss, 0 without losses
    pub profit_factor: Decimal,
    pub average_holding_secs: i64,
}

/// Reduces a trade log into round-trips and summary statistics
#[derive(Debug, Clone, Default)]
pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Pair every opening trade with the chronologically next closing trade
    /// of the same symbol and side. Closes with nothing open are ignored, as
    /// are positions still open at the end of the log.
    pub fn round_trips(&self, trades: &[Trade]) -> Vec<RoundTrip> {
        let mut open: HashMap<(&str, PositionSide), VecDeque<&Trade>> = HashMap::new();
        let mut trips = Vec::new();

        for trade in trades {
            let key = (trade.symbol.as_str(), trade.side);
            if trade.is_opening() {
                open.entry(key).or_default().push_back(trade);
                continue;
            }
            let Some(entry) = open.get_mut(&key).and_then(VecDeque::pop_front) else {
                continue;
            };
            let (buy, sell) = match trade.side {
                PositionSide::Long => (entry.price, trade.price),
                PositionSide::Short => (trade.price, entry.price),
            };
            trips.push(RoundTrip {
                symbol: trade.symbol.clone(),
                side: trade.side,
                entry_price: entry.price,
                exit_price: trade.price,
                entry_time: entry.timestamp,
                exit_time: trade.timestamp,
                profit: sell - buy,
            });
        }

        trips
    }

    pub fn calculate(&self, trades: &[Trade]) -> PerformanceSummary {
        self.summarize(&self.round_trips(trades))
    }

    /// Same statistics computed independently per symbol
    pub fn calculate_by_symbol(&self, trades: &[Trade]) -> BTreeMap<String, PerformanceSummary> {
        let mut grouped: BTreeMap<String, Vec<RoundTrip>> = BTreeMap::new();
        for trip in self.round_trips(trades) {
            grouped.entry(trip.symbol.clone()).or_default().push(trip);
        }
        grouped
            .into_iter()
            .map(|(symbol, trips)| (symbol, self.summarize(&trips)))
            .collect()
    }

    pub fn summarize(&self, trips: &[RoundTrip]) -> PerformanceSummary {
        let profits: Vec<Decimal> = trips.iter().map(|t| t.profit).collect();
        let wins: Vec<Decimal> = profits.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
        let losses: Vec<Decimal> = profits.iter().copied().filter(|p| *p < Decimal::ZERO).collect();

        let gross_profit: Decimal = wins.iter().sum();
        let gross_loss: Decimal = losses.iter().sum();

        PerformanceSummary {
            total_trades: trips.len() as u32,
            winning_trades: wins.len() as u32,
            losing_trades: losses.len() as u32,
            win_rate: self.calculate_win_rate(wins.len(), trips.len()),
            average_profit: mean(&wins),
            average_loss: mean(&losses),
            net_return: profits.iter().sum(),
            largest_win: wins.iter().copied().max().unwrap_or(Decimal::ZERO),
            largest_loss: losses.iter().copied().min().unwrap_or(Decimal::ZERO),
            profit_factor: if gross_loss.is_zero() {
                Decimal::ZERO
            } else {
                gross_profit / gross_loss.abs()
            },
            average_holding_secs: self.calculate_avg_holding(trips),
        }
    }

    fn calculate_win_rate(&self, winning_trades: usize, total_trades: usize) -> Decimal {
        if total_trades == 0 {
            return Decimal::ZERO;
        }

        Decimal::from(winning_trades) / Decimal::from(total_trades) * Decimal::from(100)
    }

    fn calculate_avg_holding(&self, trips: &[RoundTrip]) -> i64 {
        if trips.is_empty() {
            return 0;
        }
        let total: i64 = trips
            .iter()
            .map(|t| (t.exit_time - t.entry_time).num_seconds())
            .sum();
        total / trips.len() as i64
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}
