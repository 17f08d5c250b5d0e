pub mod backtest;
pub mod bot;
pub mod errors;
pub mod notifier;
pub mod parameters;
pub mod types;

// Re-export main interfaces
pub use backtest::BacktestService;
pub use bot::SignalBot;
pub use errors::ServiceError;
pub use notifier::{Notifier, TradeLogNotifier};
pub use parameters::{JsonParameterStore, ParameterStore};
pub use types::*;
