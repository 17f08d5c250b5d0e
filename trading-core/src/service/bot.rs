use super::notifier::Notifier;
use super::types::{BotConfig, BotReport, SymbolOutcome};
use super::ServiceError;
use crate::exchange::{is_market_open, HistoricalRequest, MarketDataSource, OrderExecutor, Period};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use trading_common::backtest::{
    create_pair_strategy, create_strategy, BacktestEngine, EngineEvent, OrderIntent, PairsZscore,
    Signal, Strategy, StrategyParameters, TradeAction,
};

/// Live signal bot: one evaluation of the latest bar per run.
///
/// Holds no position state between runs, so a pairs exit is reported but
/// never traded.
pub struct SignalBot {
    source: Arc<dyn MarketDataSource>,
    executor: Arc<dyn OrderExecutor>,
    notifier: Arc<dyn Notifier>,
    engine: BacktestEngine,
    config: BotConfig,
}

impl SignalBot {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        executor: Arc<dyn OrderExecutor>,
        notifier: Arc<dyn Notifier>,
        config: BotConfig,
    ) -> Self {
        Self {
            source,
            executor,
            notifier,
            engine: BacktestEngine::new(),
            config,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub async fn run_once(&self, params: &StrategyParameters) -> Result<BotReport, ServiceError> {
        self.run_once_at(params, Utc::now()).await
    }

    /// Run as if the wall clock read `now`
    pub async fn run_once_at(
        &self,
        params: &StrategyParameters,
        now: DateTime<Utc>,
    ) -> Result<BotReport, ServiceError> {
        let params = params.clone().validated()?;
        let mut report = BotReport {
            strategy: params.strategy,
            started_at: now,
            ran: false,
            outcomes: Vec::new(),
        };

        if self.config.respect_market_hours && !is_market_open(now) {
            self.note("Market is closed. Bot will not run.").await;
            return Ok(report);
        }

        info!("Starting bot run with strategy {}", params.strategy);
        report.ran = true;
        if params.strategy.is_pair() {
            let strategy = create_pair_strategy(&params)?;
            report.outcomes.push(self.evaluate_pair(&strategy).await);
        } else {
            let strategy = create_strategy(params.strategy, &params)?;
            for symbol in &self.config.watchlist {
                let outcome = self.evaluate_symbol(strategy.as_ref(), symbol, now).await;
                report.outcomes.push(outcome);
            }
        }

        self.note("Bot run complete.").await;
        Ok(report)
    }

    async fn evaluate_symbol(
        &self,
        strategy: &dyn Strategy,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> SymbolOutcome {
        let request = HistoricalRequest::new(symbol, self.config.period, self.config.interval);
        let series = match self.source.fetch_series(&request).await {
            Ok(series) => series,
            Err(e) => {
                error!("Failed to fetch {}: {}", request.symbol, e);
                self.note(&format!("Data error for {}: {}", request.symbol, e)).await;
                return SymbolOutcome::failed(&request.symbol, e);
            }
        };

        let signal = match self.engine.latest_signal(&series, strategy) {
            Ok(signal) => signal,
            Err(e) if e.is_recoverable() => {
                warn!("{}: {}, treating as no signal", request.symbol, e);
                Signal::NoSignal
            }
            Err(e) => return SymbolOutcome::failed(&request.symbol, e),
        };

        let timestamp = series.last().map(|bar| bar.timestamp).unwrap_or(now);
        self.notify(&EngineEvent::SignalComputed {
            symbol: request.symbol.clone(),
            timestamp,
            signal: signal.clone(),
        })
        .await;

        let mut outcome = SymbolOutcome::new(&request.symbol);
        let action = match signal {
            Signal::Buy => Some(TradeAction::Buy),
            Signal::Sell => Some(TradeAction::Sell),
            _ => None,
        };
        if let Some(action) = action {
            self.execute(&mut outcome, &request.symbol, action).await;
        }
        outcome.signal = Some(signal);
        outcome
    }

    async fn evaluate_pair(&self, strategy: &PairsZscore) -> SymbolOutcome {
        let label = format!("{}/{}", strategy.first_symbol(), strategy.second_symbol());
        let lookback = u32::try_from(strategy.required_bars()).unwrap_or(u32::MAX);
        let period = Period::Days(lookback.saturating_add(5));

        let mut series = Vec::with_capacity(2);
        for symbol in [strategy.first_symbol(), strategy.second_symbol()] {
            let request = HistoricalRequest::new(symbol, period, self.config.pairs_interval);
            match self.source.fetch_series(&request).await {
                Ok(s) => series.push(s),
                Err(e) => {
                    error!("Failed to fetch {}: {}", request.symbol, e);
                    self.note(&format!("Data error for {}: {}", request.symbol, e)).await;
                    return SymbolOutcome::failed(label, e);
                }
            }
        }
        let (first, second) = (&series[0], &series[1]);

        let signal = match self.engine.latest_pair_signal(first, second, strategy) {
            Ok(signal) => signal,
            Err(e) if e.is_recoverable() => {
                warn!("{}: {}, treating as no signal", label, e);
                Signal::NoSignal
            }
            Err(e) => return SymbolOutcome::failed(label, e),
        };

        let mut outcome = SymbolOutcome::new(&label);
        match &signal {
            Signal::EnterPair {
                first: a,
                second: b,
            } => {
                self.note(&format!(
                    "Pairs signal: {}-{}, {}-{}",
                    a.symbol, a.action, b.symbol, b.action
                ))
                .await;
                self.execute(&mut outcome, &a.symbol, a.action).await;
                self.execute(&mut outcome, &b.symbol, b.action).await;
            }
            Signal::ExitPair => self.note("Z-score exited. No action.").await,
            other => self.note(&format!("Pairs signal: {}", other)).await,
        }
        outcome.signal = Some(signal);
        outcome
    }

    async fn execute(&self, outcome: &mut SymbolOutcome, symbol: &str, action: TradeAction) {
        let intent = OrderIntent {
            symbol: symbol.to_string(),
            action,
            quantity: self.config.order_quantity,
        };
        match self.executor.submit(&intent).await {
            Ok(ack) => {
                self.note(&format!("{} {} executed.", symbol.to_uppercase(), action))
                    .await;
                outcome.orders.push(ack);
            }
            Err(e) => {
                error!("Order for {} failed: {}", symbol, e);
                self.note(&format!("Trade error for {}: {}", symbol, e)).await;
                outcome.errors.push(e.to_string());
            }
        }
    }

    async fn notify(&self, event: &EngineEvent) {
        if let Err(e) = self.notifier.notify(event).await {
            warn!("Notifier failed: {}", e);
        }
    }

    async fn note(&self, message: &str) {
        if let Err(e) = self.notifier.note(message).await {
            warn!("Notifier failed: {}", e);
        }
    }
}
