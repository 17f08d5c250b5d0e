// trading-common/src/backtest/types.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn opposite(&self) -> Self {
        match self {
            TradeAction::Buy => TradeAction::Sell,
            TradeAction::Sell => TradeAction::Buy,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => f.write_str("BUY"),
            TradeAction::Sell => f.write_str("SELL"),
        }
    }
}

/// Which side of the market a position was opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Action that opens a position on this side
    pub fn opening_action(&self) -> TradeAction {
        match self {
            PositionSide::Long => TradeAction::Buy,
            PositionSide::Short => TradeAction::Sell,
        }
    }

    pub fn from_opening(action: TradeAction) -> Self {
        match action {
            TradeAction::Buy => PositionSide::Long,
            TradeAction::Sell => PositionSide::Short,
        }
    }
}

/// An executed (simulated) fill. Immutable once appended to the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub action: TradeAction,
    pub side: PositionSide,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Realized profit, set only on the trade that closes a position
    pub profit: Option<Decimal>,
}

impl Trade {
    pub fn is_opening(&self) -> bool {
        self.action == self.side.opening_action()
    }

    pub fn is_closing(&self) -> bool {
        !self.is_opening()
    }

    pub fn intent(&self, quantity: Decimal) -> OrderIntent {
        OrderIntent {
            symbol: self.symbol.clone(),
            action: self.action,
            quantity,
        }
    }
}

/// What the caller should send to a broker. A submitted intent is not a fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: Decimal,
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} x{}", self.action, self.symbol, self.quantity)
    }
}
