//! Time utilities: statement dates to timezone-aware instants.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ImportError, Result};

/// Local time-of-day used when a statement date carries no time.
pub const DEFAULT_TIME_OF_DAY: &str = "12:00";

/// Separator for compound dates like "08/16/2021 as of 08/15/2021".
const AS_OF: &str = " as of ";

pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| ImportError::InvalidTimeZone(name.to_string()))
}

/// Parse `HH:MM` (24-hour).
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| ImportError::InvalidTimeOfDay(s.to_string()))
}

/// Parse a statement date `MM/DD/YYYY` into a UTC instant.
///
/// Only the leading date of a compound "X as of Y" string is used. The
/// instant is `def_time_of_day` (default [`DEFAULT_TIME_OF_DAY`]) local time
/// in `tz`, using that zone's offset on that date.
pub fn parse_mmddyyyy(
    date_str: &str,
    def_time_of_day: Option<&str>,
    tz: Tz,
) -> Result<DateTime<Utc>> {
    let lead = match date_str.find(AS_OF) {
        Some(i) => &date_str[..i],
        None => date_str,
    };

    let date = NaiveDate::parse_from_str(lead.trim(), "%m/%d/%Y")
        .map_err(|_| ImportError::InvalidDateFormat(date_str.to_string()))?;
    let time = parse_time_of_day(def_time_of_day.unwrap_or(DEFAULT_TIME_OF_DAY))?;

    localize(date.and_time(time), tz)
}

/// Resolve a naive local datetime in `tz` to UTC.
///
/// Ambiguous (fall-back) times take the earlier instant; times that fall in a
/// spring-forward gap are an error.
pub fn localize(ndt: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&ndt) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(ImportError::InvalidLocalTime {
            local: ndt.to_string(),
            tz: tz.name().to_string(),
        }),
    }
}
