#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::path::Path;
use trading_common::data::PriceBar;

/// Wednesday 2024-01-10, 09:30 New York
pub fn session_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).unwrap()
}

pub fn bars(closes: &[f64], step: Duration) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            PriceBar::from_close(
                session_start() + step * i as i32,
                Decimal::try_from(*close).unwrap(),
            )
        })
        .collect()
}

pub fn write_bars(dir: &Path, file_name: &str, bars: &[PriceBar]) {
    let body = serde_json::to_string_pretty(bars).unwrap();
    std::fs::write(dir.join(file_name), body).unwrap();
}

/// Uptrend into three straight losses: fast(2) above slow(4) on the
/// previous bar and RSI(3) at 0 on the last.
pub const OVERSOLD_IN_UPTREND: [f64; 9] = [10.0, 10.0, 10.0, 10.0, 10.0, 20.0, 19.0, 18.0, 17.0];

/// Spread A - B is flat noise followed by a spike on the last bar.
pub const PAIR_A_SPIKE: [f64; 9] = [100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 106.0];
pub const PAIR_B_FLAT: [f64; 9] = [100.0; 9];
