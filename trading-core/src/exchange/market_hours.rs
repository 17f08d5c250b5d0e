//! US equity session check.
//!
//! Regular hours are 09:30 through 16:00 America/New_York, Monday to
//! Friday, both ends inclusive. Exchange holidays are not modelled.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;

const SESSION_OPEN: (u32, u32) = (9, 30);
const SESSION_CLOSE: (u32, u32) = (16, 0);

pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&New_York);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(SESSION_OPEN.0, SESSION_OPEN.1, 0),
        NaiveTime::from_hms_opt(SESSION_CLOSE.0, SESSION_CLOSE.1, 0),
    ) else {
        return false;
    };
    let time = local.time();
    open <= time && time <= close
}
