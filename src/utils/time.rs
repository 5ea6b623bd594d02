//! Time utilities: parsing CLI/DB timestamps, countdown formatting, the clock.

use crate::errors::{AppError, AppResult};
use chrono::{Local, NaiveDateTime, Timelike};

/// Storage format for every timestamp column.
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CLI_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Drop sub-second precision; the store keeps whole seconds only.
pub fn whole_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Current local wall-clock time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    whole_seconds(Local::now().naive_local())
}

pub fn to_db(dt: &NaiveDateTime) -> String {
    dt.format(DB_FORMAT).to_string()
}

pub fn from_db(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DB_FORMAT).ok()
}

/// Parse a user supplied date-time ("YYYY-MM-DD HH:MM", seconds and a `T` separator optional).
pub fn parse_datetime(s: &str) -> AppResult<NaiveDateTime> {
    let s = s.trim();
    CLI_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .ok_or_else(|| AppError::InvalidDateTime(s.to_string()))
}

pub fn parse_optional_datetime(input: Option<&String>) -> AppResult<Option<NaiveDateTime>> {
    input.map(|s| parse_datetime(s)).transpose()
}

/// "2h 05m", "12 min"
pub fn format_countdown(mins: i64) -> String {
    let m = mins.max(0);
    if m >= 60 {
        format!("{}h {:02}m", m / 60, m % 60)
    } else {
        format!("{} min", m)
    }
}
