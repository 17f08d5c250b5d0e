// exchange/traits.rs

use super::types::{HistoricalRequest, OrderAck};
use crate::service::ServiceError;
use async_trait::async_trait;
use trading_common::backtest::OrderIntent;
use trading_common::data::PriceSeries;

/// Source of historical or live price bars
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Bars for one symbol in ascending timestamp order. An empty or
    /// malformed result fails with `ServiceError::DataUnavailable`.
    async fn fetch_series(&self, request: &HistoricalRequest) -> Result<PriceSeries, ServiceError>;
}

/// Broker interface the bot hands order intents to
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    async fn submit(&self, intent: &OrderIntent) -> Result<OrderAck, ServiceError>;
}
