//! Signal and backtest engine for technical-indicator trading strategies.
//!
//! Everything in this crate is pure computation over fully materialized
//! price series. Fetching data, submitting orders and persisting settings
//! belong to the caller (see `trading-core`).

pub mod backtest;
pub mod data;
pub mod error;

pub use error::{EngineError, EngineResult};
