// =================================================================
// exchange/file_source.rs - JSON Bar Files
// =================================================================

use super::traits::MarketDataSource;
use super::types::HistoricalRequest;
use crate::service::ServiceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use trading_common::data::{PriceBar, PriceSeries};

/// Either a bare array of bars or an object wrapping them
#[derive(Deserialize)]
#[serde(untagged)]
enum BarFile {
    Bars(Vec<PriceBar>),
    Wrapped { bars: Vec<PriceBar> },
}

impl BarFile {
    fn into_bars(self) -> Vec<PriceBar> {
        match self {
            BarFile::Bars(bars) | BarFile::Wrapped { bars } => bars,
        }
    }
}

/// Reads bars from `{dir}/{SYMBOL}_{interval}.json`, falling back to
/// `{dir}/{SYMBOL}.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self, request: &HistoricalRequest) -> [PathBuf; 2] {
        [
            self.dir
                .join(format!("{}_{}.json", request.symbol, request.interval)),
            self.dir.join(format!("{}.json", request.symbol)),
        ]
    }

    async fn read_first_existing(&self, request: &HistoricalRequest) -> Result<String, ServiceError> {
        for path in self.candidates(request) {
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => {
                    debug!("Reading bars for {} from {:?}", request.symbol, path);
                    return Ok(contents);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(ServiceError::data_unavailable(&request.symbol, e)),
            }
        }
        Err(ServiceError::data_unavailable(
            &request.symbol,
            format!("no bar file in {:?}", self.dir),
        ))
    }
}

#[async_trait]
impl MarketDataSource for JsonFileSource {
    async fn fetch_series(&self, request: &HistoricalRequest) -> Result<PriceSeries, ServiceError> {
        let contents = self.read_first_existing(request).await?;
        let mut bars = serde_json::from_str::<BarFile>(&contents)
            .map_err(|e| ServiceError::data_unavailable(&request.symbol, format!("malformed bar file: {}", e)))?
            .into_bars();

        bars.sort_by_key(|bar| bar.timestamp);
        // Repeated identical bars collapse; differing bars at one timestamp are a data error.
        bars.dedup();
        if let Some(pair) = bars.windows(2).find(|pair| pair[0].timestamp == pair[1].timestamp) {
            return Err(ServiceError::data_unavailable(
                &request.symbol,
                format!("conflicting bars at {}", pair[0].timestamp),
            ));
        }

        let latest = bars
            .last()
            .map(|bar| bar.timestamp)
            .ok_or_else(|| ServiceError::data_unavailable(&request.symbol, "no bars"))?;
        if let Some(start) = request.period.start_from(latest) {
            bars.retain(|bar| bar.timestamp >= start);
        }

        debug!(
            "Loaded {} bars for {} ({} / {})",
            bars.len(),
            request.symbol,
            request.period,
            request.interval
        );
        Ok(PriceSeries::new(request.symbol.clone(), bars)?)
    }
}
