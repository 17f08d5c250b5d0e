use super::notifier::Notifier;
use super::ServiceError;
use crate::exchange::{HistoricalRequest, Interval, MarketDataSource, Period};
use std::sync::Arc;
use tracing::{info, warn};
use trading_common::backtest::{
    create_pair_strategy, create_strategy, BacktestEngine, EngineEvent, MultiBacktestResult,
    PairBacktestResult, SkippedSymbol, StrategyKind, StrategyParameters,
};
use trading_common::data::PriceSeries;

/// Fetches history through a data source and replays it through the engine
pub struct BacktestService {
    source: Arc<dyn MarketDataSource>,
    engine: BacktestEngine,
    notifier: Option<Arc<dyn Notifier>>,
}

impl BacktestService {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            engine: BacktestEngine::new(),
            notifier: None,
        }
    }

    /// Forward every engine event of a finished run to `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Single-series backtest over each symbol. Symbols whose data cannot be
    /// fetched are reported as skipped alongside those with too little history.
    pub async fn backtest(
        &self,
        kind: StrategyKind,
        symbols: &[String],
        period: Period,
        interval: Interval,
        params: &StrategyParameters,
    ) -> Result<MultiBacktestResult, ServiceError> {
        if symbols.is_empty() {
            return Err(ServiceError::Config("No symbols configured".to_string()));
        }
        let strategy = create_strategy(kind, params)?;

        let mut series = Vec::with_capacity(symbols.len());
        let mut unavailable = Vec::new();
        for symbol in symbols {
            let request = HistoricalRequest::new(symbol, period, interval);
            match self.source.fetch_series(&request).await {
                Ok(s) => series.push(s),
                Err(e @ ServiceError::DataUnavailable { .. }) => {
                    warn!("Skipping {}: {}", request.symbol, e);
                    unavailable.push(SkippedSymbol {
                        symbol: request.symbol,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Running {} backtest over {} symbols ({} / {})",
            kind,
            series.len(),
            period,
            interval
        );
        let mut result = self.engine.run_many(&series, strategy.as_ref())?;
        result.skipped.extend(unavailable);

        for run in &result.results {
            self.forward(&run.events).await;
        }
        Ok(result)
    }

    pub async fn backtest_pair(
        &self,
        period: Period,
        interval: Interval,
        params: &StrategyParameters,
    ) -> Result<PairBacktestResult, ServiceError> {
        let strategy = create_pair_strategy(params)?;
        let first = self
            .fetch(strategy.first_symbol(), period, interval)
            .await?;
        let second = self
            .fetch(strategy.second_symbol(), period, interval)
            .await?;

        let result = self.engine.run_pair(&first, &second, &strategy)?;
        self.forward(&result.events).await;
        Ok(result)
    }

    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries, ServiceError> {
        let request = HistoricalRequest::new(symbol, period, interval);
        self.source.fetch_series(&request).await
    }

    async fn forward(&self, events: &[EngineEvent]) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        for event in events {
            if matches!(event, EngineEvent::SignalComputed { .. }) {
                continue;
            }
            if let Err(e) = notifier.notify(event).await {
                warn!("Notifier failed: {}", e);
                return;
            }
        }
    }
}
