use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trading_common::backtest::{
    list_strategies, MultiBacktestResult, PairBacktestResult, PerformanceSummary, StrategyKind,
    StrategyParameters,
};
use trading_core::{
    config::Settings,
    exchange::{Interval, JsonFileSource, PaperExecutor, Period},
    service::{
        BacktestService, BotReport, JsonParameterStore, Notifier, ParameterStore, SignalBot,
        TradeLogNotifier,
    },
};

#[derive(Parser)]
#[command(name = "trading-core")]
#[command(about = "Technical-indicator signals, backtests and a paper-trading bot")]
enum Commands {
    /// Backtest a single-series strategy over one or more symbols
    Backtest {
        /// Comma-separated symbols; defaults to the bot watch list
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,
        /// Strategy id; defaults to the one selected in the parameter file
        #[arg(long)]
        strategy: Option<String>,
        #[arg(short, long)]
        period: Option<String>,
        #[arg(short, long)]
        interval: Option<String>,
        /// Append trade events to the trade log
        #[arg(long)]
        log_events: bool,
        #[arg(long)]
        json: bool,
    },
    /// Backtest the pairs z-score strategy on the configured pair
    Pairs {
        #[arg(short, long)]
        period: Option<String>,
        #[arg(short, long)]
        interval: Option<String>,
        #[arg(long)]
        log_events: bool,
        #[arg(long)]
        json: bool,
    },
    /// Evaluate the latest bar once and submit paper orders
    Bot {
        #[arg(long)]
        ignore_market_hours: bool,
        #[arg(long)]
        json: bool,
    },
    /// List available strategies
    Strategies {
        #[arg(long)]
        json: bool,
    },
    /// Inspect or create the strategy parameter file
    Params {
        #[command(subcommand)]
        action: ParamsAction,
    },
}

#[derive(Subcommand)]
enum ParamsAction {
    /// Print the effective parameters
    Show,
    /// Validate a parameter file
    Validate { path: Option<PathBuf> },
    /// Write a parameter file with default values
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("failed to load settings")?;
    let store = JsonParameterStore::new(&settings.parameters.path);
    let source = Arc::new(JsonFileSource::new(&settings.data.dir));

    match Commands::parse() {
        Commands::Backtest {
            symbols,
            strategy,
            period,
            interval,
            log_events,
            json,
        } => {
            let params = store.load_parameters().await?;
            let kind = match strategy {
                Some(id) => id.parse::<StrategyKind>()?,
                None => params.strategy,
            };
            if kind.is_pair() {
                bail!("{} needs two series, use the `pairs` command", kind);
            }
            let symbols = if symbols.is_empty() {
                settings.bot.bot_config().watchlist
            } else {
                symbols
            };
            let (period, interval) = request_shape(&settings, period, interval)?;

            let mut service = BacktestService::new(source);
            if log_events {
                service = service.with_notifier(trade_log(&settings));
            }
            let result = service
                .backtest(kind, &symbols, period, interval, &params)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_backtest(&result);
            }
        }

        Commands::Pairs {
            period,
            interval,
            log_events,
            json,
        } => {
            let params = store.load_parameters().await?;
            let (period, interval) = request_shape(&settings, period, interval)?;

            let mut service = BacktestService::new(source);
            if log_events {
                service = service.with_notifier(trade_log(&settings));
            }
            let result = service.backtest_pair(period, interval, &params).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_pairs(&result);
            }
        }

        Commands::Bot {
            ignore_market_hours,
            json,
        } => {
            let params = store.load_parameters().await?;
            let mut config = settings.bot.bot_config();
            if ignore_market_hours {
                config.respect_market_hours = false;
            }
            let bot = SignalBot::new(
                source,
                Arc::new(PaperExecutor::new()),
                trade_log(&settings),
                config,
            );
            let report = bot.run_once(&params).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_bot_report(&report);
            }
        }

        Commands::Strategies { json } => {
            let strategies = list_strategies();
            if json {
                println!("{}", serde_json::to_string_pretty(&strategies)?);
            } else {
                for info in strategies {
                    println!("{:<14} {:<26} {}", info.id, info.name, info.description);
                }
            }
        }

        Commands::Params { action } => match action {
            ParamsAction::Show => {
                let params = store.load_parameters().await?;
                println!("{}", serde_json::to_string_pretty(&params)?);
            }
            ParamsAction::Validate { path } => {
                let store = path.map(JsonParameterStore::new).unwrap_or(store);
                let params = store.load_parameters().await?;
                println!(
                    "{:?} is valid (active strategy: {})",
                    store.path(),
                    params.strategy
                );
            }
            ParamsAction::Init { force } => {
                if store.path().exists() && !force {
                    bail!("{:?} already exists, pass --force to overwrite", store.path());
                }
                store.save_parameters(&StrategyParameters::default()).await?;
                info!("Wrote default parameters to {:?}", store.path());
            }
        },
    }

    Ok(())
}

fn request_shape(
    settings: &Settings,
    period: Option<String>,
    interval: Option<String>,
) -> anyhow::Result<(Period, Interval)> {
    let period = match period {
        Some(p) => p.parse()?,
        None => settings.data.default_period,
    };
    let interval = match interval {
        Some(i) => i.parse()?,
        None => settings.data.default_interval,
    };
    Ok((period, interval))
}

fn trade_log(settings: &Settings) -> Arc<dyn Notifier> {
    Arc::new(TradeLogNotifier::new(&settings.bot.trade_log))
}

fn print_summary(metrics: &PerformanceSummary) {
    println!("Total Trades: {}", metrics.total_trades);
    println!("Win Rate: {:.2}%", metrics.win_rate);
    println!("Avg Profit: {:.2}", metrics.average_profit);
    println!("Avg Loss: {:.2}", metrics.average_loss);
    println!("Net Return: {:.2}", metrics.net_return);
    println!("Largest Win: {:.2}", metrics.largest_win);
    println!("Largest Loss: {:.2}", metrics.largest_loss);
    println!("Profit Factor: {:.2}", metrics.profit_factor);
}

fn print_backtest(result: &MultiBacktestResult) {
    println!("\nBacktest Results ({}):", result.strategy);
    print_summary(&result.combined);

    for (symbol, metrics) in &result.by_symbol {
        println!("\n{}:", symbol);
        print_summary(metrics);
    }
    for skipped in &result.skipped {
        println!("\nSkipped {}: {}", skipped.symbol, skipped.reason);
    }

    println!("\nTrade History:");
    for run in &result.results {
        for trade in &run.trades {
            println!(
                "{} {} {} @ {}",
                trade.timestamp.format("%Y-%m-%d %H:%M:%S"),
                trade.action,
                trade.symbol,
                trade.price
            );
        }
    }
}

fn print_pairs(result: &PairBacktestResult) {
    println!(
        "\nPairs Backtest Results ({}/{}):",
        result.symbols.0, result.symbols.1
    );
    println!("Closed Pairs: {}", result.pair_profits.len());
    println!("Net Pair Return: {:.2}", result.net_pair_return);
    for (i, profit) in result.pair_profits.iter().enumerate() {
        println!("  pair {}: {:.2}", i + 1, profit);
    }
    println!("\nLeg statistics:");
    print_summary(&result.metrics);
}

fn print_bot_report(report: &BotReport) {
    if !report.ran {
        println!("Market is closed. Bot did not run.");
        return;
    }
    println!("Bot run ({}):", report.strategy);
    for outcome in &report.outcomes {
        let signal = outcome
            .signal
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} signal: {:<28} orders: {}",
            outcome.symbol,
            signal,
            outcome.orders.len()
        );
        for error in &outcome.errors {
            println!("           error: {}", error);
        }
    }
}
