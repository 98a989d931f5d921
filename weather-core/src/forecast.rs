//! Reduces the provider's flat 3-hour forecast list into the two lists the
//! dashboard shows: the next few slots verbatim, and one slot per coming day.

use chrono::TimeZone;
use std::fmt::Display;

use crate::model::{Forecast, ForecastEntry, ForecastRecord};

/// Number of upcoming 3-hour slots shown as-is.
pub const HOURLY_COUNT: usize = 5;
/// First record used for the daily list; indices below it cover today.
pub const DAILY_START: usize = 8;
/// 8 records × 3 hours = one day.
pub const DAILY_STRIDE: usize = 8;
pub const DAILY_COUNT: usize = 4;

pub const HOURLY_LABEL_FORMAT: &str = "%H:%M";
/// e.g. "Mon Oct 19 2026".
pub const DAILY_LABEL_FORMAT: &str = "%a %b %d %Y";

/// Build both display lists, labelling timestamps in `tz`.
///
/// Short input is not an error: fewer than [`HOURLY_COUNT`] records gives a
/// shorter hourly list, and `DAILY_START` records or fewer give no daily rows.
pub fn summarize<Tz>(records: &[ForecastRecord], tz: &Tz) -> Forecast
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let hourly = records
        .iter()
        .take(HOURLY_COUNT)
        .map(|r| entry(r, tz, HOURLY_LABEL_FORMAT))
        .collect();

    let daily = records
        .iter()
        .skip(DAILY_START)
        .step_by(DAILY_STRIDE)
        .take(DAILY_COUNT)
        .map(|r| entry(r, tz, DAILY_LABEL_FORMAT))
        .collect();

    Forecast { hourly, daily }
}

fn entry<Tz>(record: &ForecastRecord, tz: &Tz, format: &str) -> ForecastEntry
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ForecastEntry {
        label: record.timestamp.with_timezone(tz).format(format).to_string(),
        timestamp: record.timestamp,
        temperature_max: record.temperature_max,
        temperature_min: record.temperature_min,
        description: record.description.clone(),
    }
}
