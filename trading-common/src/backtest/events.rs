// trading-common/src/backtest/events.rs

use super::portfolio::Transition;
use super::strategy::Signal;
use super::types::Trade;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Observable engine output, in the order things happened
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    SignalComputed {
        symbol: String,
        timestamp: DateTime<Utc>,
        signal: Signal,
    },
    TradeOpened {
        trade: Trade,
    },
    TradeClosed {
        trade: Trade,
    },
    PairOpened {
        first: Trade,
        second: Trade,
    },
    PairClosed {
        first: Trade,
        second: Trade,
        net_profit: Decimal,
    },
}

impl EngineEvent {
    pub fn from_transition(transition: &Transition) -> Option<Self> {
        match transition {
            Transition::Unchanged => None,
            Transition::Opened(trade) => Some(EngineEvent::TradeOpened {
                trade: trade.clone(),
            }),
            Transition::Closed(trade) => Some(EngineEvent::TradeClosed {
                trade: trade.clone(),
            }),
            Transition::PairOpened([first, second]) => Some(EngineEvent::PairOpened {
                first: first.clone(),
                second: second.clone(),
            }),
            Transition::PairClosed {
                trades: [first, second],
                net_profit,
            } => Some(EngineEvent::PairClosed {
                first: first.clone(),
                second: second.clone(),
                net_profit: *net_profit,
            }),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            EngineEvent::SignalComputed { timestamp, .. } => *timestamp,
            EngineEvent::TradeOpened { trade } | EngineEvent::TradeClosed { trade } => {
                trade.timestamp
            }
            EngineEvent::PairOpened { first, .. } | EngineEvent::PairClosed { first, .. } => {
                first.timestamp
            }
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::SignalComputed { symbol, signal, .. } => {
                write!(f, "{} signal: {}", symbol, signal)
            }
            EngineEvent::TradeOpened { trade } => {
                write!(f, "{} {} @ {}", trade.action, trade.symbol, trade.price)
            }
            EngineEvent::TradeClosed { trade } => write!(
                f,
                "{} {} @ {} (P/L {})",
                trade.action,
                trade.symbol,
                trade.price,
                trade.profit.unwrap_or_default()
            ),
            EngineEvent::PairOpened { first, second } => write!(
                f,
                "pair opened: {} {} @ {}, {} {} @ {}",
                first.action, first.symbol, first.price, second.action, second.symbol, second.price
            ),
            EngineEvent::PairClosed {
                first,
                second,
                net_profit,
            } => write!(
                f,
                "pair closed: {}/{} net P/L {}",
                first.symbol, second.symbol, net_profit
            ),
        }
    }
}
