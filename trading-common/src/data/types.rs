// =================================================================
// data/types.rs - Price Data Structures
// =================================================================

use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One OHLCV bar as produced by a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Decimal,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar whose open/high/low all equal the close. Handy for close-only feeds.
    pub fn from_close(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self::new(timestamp, close, close, close, close, Decimal::ZERO)
    }

    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(f64::NAN)
    }
}

/// Bars for a single symbol with strictly increasing timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting duplicate or decreasing timestamps.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> EngineResult<Self> {
        let symbol = symbol.into();
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(EngineError::OutOfOrderBar {
                    symbol,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Close column as floats, aligned 1:1 with the bars
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(PriceBar::close_f64).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }
}

/// Two series joined on their common timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub first: PriceSeries,
    pub second: PriceSeries,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }
}

/// Inner-join two series on timestamp. Bars present in only one series are dropped.
pub fn align_pair(first: &PriceSeries, second: &PriceSeries) -> EngineResult<AlignedPair> {
    let by_time: HashMap<DateTime<Utc>, &PriceBar> =
        second.bars.iter().map(|b| (b.timestamp, b)).collect();

    let mut left = Vec::new();
    let mut right = Vec::new();
    for bar in &first.bars {
        if let Some(other) = by_time.get(&bar.timestamp) {
            left.push(bar.clone());
            right.push((*other).clone());
        }
    }

    if left.is_empty() && !(first.is_empty() && second.is_empty()) {
        return Err(EngineError::SeriesMismatch(format!(
            "{} and {} share no timestamps",
            first.symbol, second.symbol
        )));
    }

    // Both inputs are already ordered, so the join preserves ordering.
    Ok(AlignedPair {
        first: PriceSeries {
            symbol: first.symbol.clone(),
            bars: left,
        },
        second: PriceSeries {
            symbol: second.symbol.clone(),
            bars: right,
        },
    })
}
