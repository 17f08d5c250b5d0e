// =================================================================
// exchange/types.rs - Request and Acknowledgement Types
// =================================================================

use crate::service::ServiceError;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trading_common::backtest::OrderIntent;

/// How far back a historical request reaches from the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    Days(u32),
    Months(u32),
    Years(u32),
}

impl Period {
    /// Earliest timestamp covered when the most recent bar is at `latest`
    pub fn start_from(&self, latest: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Days(n) => latest.checked_sub_signed(Duration::days(i64::from(*n))),
            Period::Months(n) => latest.checked_sub_months(Months::new(*n)),
            Period::Years(n) => latest.checked_sub_months(Months::new(n.checked_mul(12)?)),
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::Months(3)
    }
}

impl FromStr for Period {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ServiceError::Parse(format!("period '{}' has no unit", s)))?;
        let (count, unit) = s.split_at(split);
        let count: u32 = count
            .parse()
            .map_err(|_| ServiceError::Parse(format!("period '{}' has no count", s)))?;
        if count == 0 {
            return Err(ServiceError::Parse(format!("period '{}' is empty", s)));
        }

        match unit {
            "d" => Ok(Period::Days(count)),
            "mo" => Ok(Period::Months(count)),
            "y" => Ok(Period::Years(count)),
            other => Err(ServiceError::Parse(format!("unknown period unit '{}'", other))),
        }
    }
}

impl TryFrom<String> for Period {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Days(n) => write!(f, "{}d", n),
            Period::Months(n) => write!(f, "{}mo", n),
            Period::Years(n) => write!(f, "{}y", n),
        }
    }
}

/// Bar size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    pub fn id(&self) -> &'static str {
        match self {
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
        }
    }
}

impl FromStr for Interval {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "15m" => Ok(Interval::FifteenMinutes),
            "1h" | "60m" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            other => Err(ServiceError::Parse(format!("unsupported interval '{}'", other))),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Parameters for querying historical bars
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRequest {
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
}

impl HistoricalRequest {
    pub fn new(symbol: &str, period: Period, interval: Interval) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            period,
            interval,
        }
    }
}

/// Broker acknowledgement of a submitted intent. Not a fill confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAck {
    pub order_id: String,
    pub intent: OrderIntent,
    pub submitted_at: DateTime<Utc>,
}
