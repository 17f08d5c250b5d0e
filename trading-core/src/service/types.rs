use crate::exchange::{Interval, OrderAck, Period};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use trading_common::backtest::{Signal, StrategyKind};

/// Bot run configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub watchlist: Vec<String>,
    pub order_quantity: Decimal,
    pub respect_market_hours: bool,
    /// History fetched per symbol for single-series strategies
    pub period: Period,
    pub interval: Interval,
    /// Bar size for the pairs strategy; its period follows the lookback
    pub pairs_interval: Interval,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            watchlist: vec!["AAPL".to_string(), "MSFT".to_string(), "GOOGL".to_string()],
            order_quantity: Decimal::ONE,
            respect_market_hours: true,
            period: Period::Days(5),
            interval: Interval::FifteenMinutes,
            pairs_interval: Interval::OneHour,
        }
    }
}

/// Result of one symbol (or one pair) in a bot run
#[derive(Debug, Clone, Serialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub signal: Option<Signal>,
    pub orders: Vec<OrderAck>,
    pub errors: Vec<String>,
}

impl SymbolOutcome {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            signal: None,
            orders: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn failed(symbol: impl Into<String>, error: impl ToString) -> Self {
        let mut outcome = Self::new(symbol);
        outcome.errors.push(error.to_string());
        outcome
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BotReport {
    pub strategy: StrategyKind,
    pub started_at: DateTime<Utc>,
    /// False when the run was skipped outside market hours
    pub ran: bool,
    pub outcomes: Vec<SymbolOutcome>,
}

impl BotReport {
    pub fn orders_submitted(&self) -> usize {
        self.outcomes.iter().map(|o| o.orders.len()).sum()
    }
}
