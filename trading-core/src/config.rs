use crate::exchange::{Interval, Period};
use crate::service::BotConfig;
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding `{SYMBOL}_{interval}.json` bar files
    pub dir: PathBuf,
    pub default_period: Period,
    pub default_interval: Interval,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            default_period: Period::Years(1),
            default_interval: Interval::OneDay,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    pub watchlist: Vec<String>,
    pub order_quantity: Decimal,
    pub respect_market_hours: bool,
    pub trade_log: PathBuf,
    pub period: Period,
    pub interval: Interval,
    pub pairs_interval: Interval,
}

impl Default for BotSettings {
    fn default() -> Self {
        let bot = BotConfig::default();
        Self {
            watchlist: bot.watchlist,
            order_quantity: bot.order_quantity,
            respect_market_hours: bot.respect_market_hours,
            trade_log: PathBuf::from("bot_log.txt"),
            period: bot.period,
            interval: bot.interval,
            pairs_interval: bot.pairs_interval,
        }
    }
}

impl BotSettings {
    pub fn bot_config(&self) -> BotConfig {
        BotConfig {
            watchlist: self.watchlist.iter().map(|s| s.trim().to_uppercase()).collect(),
            order_quantity: self.order_quantity,
            respect_market_hours: self.respect_market_hours,
            period: self.period,
            interval: self.interval,
            pairs_interval: self.pairs_interval,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParameterSettings {
    pub path: PathBuf,
}

impl Default for ParameterSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("settings.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub bot: BotSettings,
    pub parameters: ParameterSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());
        Self::load(Path::new(&config_dir), &run_mode)
    }

    /// `{dir}/default`, then `{dir}/{run_mode}`, then `TRADING_*` variables.
    /// Every file is optional.
    pub fn load(dir: &Path, run_mode: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(run_mode)).required(false))
            .add_source(
                Environment::with_prefix("TRADING")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("bot.watchlist")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize()
    }
}
