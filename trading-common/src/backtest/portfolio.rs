// trading-common/src/backtest/portfolio.rs

use super::strategy::Signal;
use super::types::{PositionSide, Trade, TradeAction};
use crate::data::PriceBar;
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Single-symbol position state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Position {
    Flat,
    Long {
        entry_price: Decimal,
        entry_time: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenLeg {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: Decimal,
}

impl OpenLeg {
    fn realized(&self, exit_price: Decimal) -> Decimal {
        match self.side {
            PositionSide::Long => exit_price - self.entry_price,
            PositionSide::Short => self.entry_price - exit_price,
        }
    }
}

/// Combined two-symbol position of the pairs strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PairPosition {
    Flat,
    Open {
        first: OpenLeg,
        second: OpenLeg,
        opened_at: DateTime<Utc>,
    },
}

/// What processing one bar did to the book
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Unchanged,
    Opened(Trade),
    Closed(Trade),
    PairOpened([Trade; 2]),
    PairClosed { trades: [Trade; 2], net_profit: Decimal },
}

impl Transition {
    pub fn trades(&self) -> &[Trade] {
        match self {
            Transition::Unchanged => &[],
            Transition::Opened(trade) | Transition::Closed(trade) => std::slice::from_ref(trade),
            Transition::PairOpened(trades) => trades,
            Transition::PairClosed { trades, .. } => trades,
        }
    }
}

/// Turns signals into trades, one bar at a time, per symbol.
///
/// Long-only for single symbols: a Buy while long and a Sell while flat are
/// ignored. Bars for the same key must arrive with increasing timestamps.
#[derive(Debug, Default)]
pub struct PositionTracker {
    positions: HashMap<String, Position>,
    pairs: HashMap<(String, String), PairPosition>,
    last_seen: HashMap<String, DateTime<Utc>>,
    trades: Vec<Trade>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, symbol: &str) -> Position {
        self.positions.get(symbol).cloned().unwrap_or(Position::Flat)
    }

    pub fn pair_position(&self, first: &str, second: &str) -> PairPosition {
        self.pairs
            .get(&(first.to_string(), second.to_string()))
            .cloned()
            .unwrap_or(PairPosition::Flat)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Apply one bar's signal for a single symbol.
    pub fn on_bar(
        &mut self,
        symbol: &str,
        bar: &PriceBar,
        signal: &Signal,
    ) -> EngineResult<Transition> {
        self.check_order(symbol, bar.timestamp)?;

        let current = self.position(symbol);
        let transition = match (current, signal) {
            (Position::Flat, Signal::Buy) => {
                self.positions.insert(
                    symbol.to_string(),
                    Position::Long {
                        entry_price: bar.close,
                        entry_time: bar.timestamp,
                    },
                );
                let trade = self.record(Trade {
                    symbol: symbol.to_string(),
                    action: TradeAction::Buy,
                    side: PositionSide::Long,
                    price: bar.close,
                    timestamp: bar.timestamp,
                    profit: None,
                });
                Transition::Opened(trade)
            }
            (Position::Long { entry_price, .. }, Signal::Sell) => {
                self.positions.insert(symbol.to_string(), Position::Flat);
                let trade = self.record(Trade {
                    symbol: symbol.to_string(),
                    action: TradeAction::Sell,
                    side: PositionSide::Long,
                    price: bar.close,
                    timestamp: bar.timestamp,
                    profit: Some(bar.close - entry_price),
                });
                Transition::Closed(trade)
            }
            (state, signal) => {
                if signal.is_actionable() {
                    debug!("{} {} ignored while {:?}", symbol, signal, state);
                }
                Transition::Unchanged
            }
        };
        Ok(transition)
    }

    /// Apply one aligned bar pair's signal to the combined pair position.
    pub fn on_pair_bar(
        &mut self,
        first: (&str, &PriceBar),
        second: (&str, &PriceBar),
        signal: &Signal,
    ) -> EngineResult<Transition> {
        let (first_symbol, first_bar) = first;
        let (second_symbol, second_bar) = second;
        if first_bar.timestamp != second_bar.timestamp {
            return Err(EngineError::SeriesMismatch(format!(
                "{} bar at {} paired with {} bar at {}",
                first_symbol, first_bar.timestamp, second_symbol, second_bar.timestamp
            )));
        }
        let book_key = format!("{}/{}", first_symbol, second_symbol);
        self.check_order(&book_key, first_bar.timestamp)?;

        let key = (first_symbol.to_string(), second_symbol.to_string());
        let current = self.pair_position(first_symbol, second_symbol);

        let transition = match (current, signal) {
            (PairPosition::Flat, Signal::EnterPair { first: a, second: b }) => {
                let legs = [
                    (first_symbol, first_bar, a.action),
                    (second_symbol, second_bar, b.action),
                ];
                let trades = legs.map(|(symbol, bar, action)| Trade {
                    symbol: symbol.to_string(),
                    action,
                    side: PositionSide::from_opening(action),
                    price: bar.close,
                    timestamp: bar.timestamp,
                    profit: None,
                });
                self.pairs.insert(
                    key,
                    PairPosition::Open {
                        first: open_leg(&trades[0]),
                        second: open_leg(&trades[1]),
                        opened_at: first_bar.timestamp,
                    },
                );
                for trade in &trades {
                    self.record(trade.clone());
                }
                Transition::PairOpened(trades)
            }
            (PairPosition::Open { first, second, .. }, Signal::ExitPair) => {
                let trades = [(first, first_bar), (second, second_bar)].map(|(leg, bar)| Trade {
                    symbol: leg.symbol.clone(),
                    action: leg.side.opening_action().opposite(),
                    side: leg.side,
                    price: bar.close,
                    timestamp: bar.timestamp,
                    profit: Some(leg.realized(bar.close)),
                });
                let net_profit: Decimal = trades.iter().filter_map(|t| t.profit).sum();
                self.pairs.insert(key, PairPosition::Flat);
                for trade in &trades {
                    self.record(trade.clone());
                }
                info!("Closed pair {} net P/L {}", book_key, net_profit);
                Transition::PairClosed { trades, net_profit }
            }
            (state, signal) => {
                if signal.is_actionable() {
                    debug!("{} {} ignored while {:?}", book_key, signal, state);
                }
                Transition::Unchanged
            }
        };
        Ok(transition)
    }

    fn check_order(&mut self, key: &str, timestamp: DateTime<Utc>) -> EngineResult<()> {
        if let Some(previous) = self.last_seen.get(key) {
            if timestamp <= *previous {
                return Err(EngineError::OutOfOrderBar {
                    symbol: key.to_string(),
                    previous: *previous,
                    current: timestamp,
                });
            }
        }
        self.last_seen.insert(key.to_string(), timestamp);
        Ok(())
    }

    fn record(&mut self, trade: Trade) -> Trade {
        info!(
            "Executed trade: {} {} {} @ {}",
            trade.timestamp, trade.action, trade.symbol, trade.price
        );
        self.trades.push(trade.clone());
        trade
    }
}

fn open_leg(trade: &Trade) -> OpenLeg {
    OpenLeg {
        symbol: trade.symbol.clone(),
        side: trade.side,
        entry_price: trade.price,
    }
}
