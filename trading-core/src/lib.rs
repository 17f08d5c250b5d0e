//! Collaborators and orchestration around the `trading-common` engine:
//! application settings, the parameter store, market data sources, order
//! executors, notifiers, the signal bot and the backtest service.

pub mod config;
pub mod exchange;
pub mod service;
