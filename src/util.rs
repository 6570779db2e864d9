//! Extra utilities for use elsewhere in the API.

use serde::Deserialize;
use time::format_description::FormatItem;
use time::macros::{date, format_description};
use time::{Date, PrimitiveDateTime, Time};

use crate::error::{CenterError, CenterResult};

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
pub const CLOCK_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
pub const CLOCK_WITH_SECONDS_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");
pub const DATETIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// The date every stored start/end timestamp is anchored to.
///
/// Slots store the time of day as a full timestamp; the real class date
/// lives in its own column.
pub const PLACEHOLDER_DATE: Date = date!(2026 - 01 - 01);

time::serde::format_description!(pub date_format, Date, "[year]-[month]-[day]");
time::serde::format_description!(pub clock_format, PrimitiveDateTime, "[hour]:[minute]");
time::serde::format_description!(
    pub datetime_format,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second]"
);

pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), DATE_FORMAT).ok()
}

/// Parses a time of day written as `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(value: &str) -> Option<Time> {
    let value = value.trim();
    Time::parse(value, CLOCK_FORMAT)
        .or_else(|_| Time::parse(value, CLOCK_WITH_SECONDS_FORMAT))
        .ok()
}

pub fn parse_datetime(value: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value.trim(), DATETIME_FORMAT).ok()
}

/// Anchors a time of day to [PLACEHOLDER_DATE].
pub fn anchor_clock(time: Time) -> PrimitiveDateTime {
    PrimitiveDateTime::new(PLACEHOLDER_DATE, time)
}

/// The English weekday name stored on schedule slots, e.g. `Saturday`.
pub fn weekday_label(date: Date) -> String {
    date.weekday().to_string()
}

pub fn require_date(value: Option<&str>, field: &str) -> CenterResult<Date> {
    let value = require_text(value, field)?;
    parse_date(value)
        .ok_or_else(|| CenterError::Validation(format!("{} must be a YYYY-MM-DD date", field)))
}

/// Returns the trimmed value if it is present and not blank.
pub fn require_text<'a>(value: Option<&'a str>, field: &str) -> CenterResult<&'a str> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(CenterError::Validation(format!("{} is required", field))),
    }
}

/// A number that clients may send either as a JSON number or as a numeric
/// string, e.g. `7` or `"7"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(i64),
    Text(String),
}

impl LooseNumber {
    pub fn parse(&self, field: &str) -> CenterResult<i64> {
        match self {
            LooseNumber::Number(number) => Ok(*number),
            LooseNumber::Text(text) => text.trim().parse().map_err(|_| {
                CenterError::Validation(format!("{} must be numeric, got `{}`", field, text))
            }),
        }
    }
}

/// Parses an id taken from a path segment or query string.
pub fn parse_id(value: &str, field: &str) -> CenterResult<i64> {
    LooseNumber::Text(value.to_owned()).parse(field)
}

pub fn require_id(value: Option<&str>, field: &str) -> CenterResult<i64> {
    parse_id(require_text(value, field)?, field)
}

pub fn require_number(value: Option<&LooseNumber>, field: &str) -> CenterResult<i64> {
    value
        .ok_or_else(|| CenterError::Validation(format!("{} is required", field)))?
        .parse(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::time;
    use time::Weekday;

    #[test]
    fn clocks_parse_with_and_without_seconds() {
        assert_eq!(parse_clock("09:30"), Some(time!(9:30)));
        assert_eq!(parse_clock("17:05:00"), Some(time!(17:05)));
        assert_eq!(parse_clock("25:00"), None);
        assert_eq!(parse_clock("soon"), None);
    }

    #[test]
    fn anchored_clocks_keep_the_time_of_day() {
        let anchored = anchor_clock(time!(14:15));

        assert_eq!(anchored.date(), PLACEHOLDER_DATE);
        assert_eq!(anchored.time(), time!(14:15));
    }

    #[test]
    fn weekday_is_derived_from_the_date() {
        let saturday = date!(2026 - 10 - 17);

        assert_eq!(saturday.weekday(), Weekday::Saturday);
        assert_eq!(weekday_label(saturday), "Saturday");
    }

    #[test]
    fn loose_numbers_accept_numbers_and_numeric_text() {
        let from_number: LooseNumber = serde_json::from_str("12").unwrap();
        let from_text: LooseNumber = serde_json::from_str("\" 12 \"").unwrap();
        let garbage: LooseNumber = serde_json::from_str("\"twelve\"").unwrap();

        assert_eq!(from_number.parse("id").unwrap(), 12);
        assert_eq!(from_text.parse("id").unwrap(), 12);
        assert!(matches!(
            garbage.parse("id"),
            Err(CenterError::Validation(_))
        ));
    }

    #[test]
    fn path_ids_must_be_numeric() {
        assert_eq!(parse_id("42", "id").unwrap(), 42);
        assert!(matches!(
            parse_id("abc", "id"),
            Err(CenterError::Validation(_))
        ));
        assert!(matches!(
            require_id(None, "teacherId"),
            Err(CenterError::Validation(_))
        ));
    }

    #[test]
    fn blank_text_is_missing() {
        assert!(require_text(Some("   "), "name").is_err());
        assert!(require_text(None, "name").is_err());
        assert_eq!(require_text(Some(" Ada "), "name").unwrap(), "Ada");
    }

    #[test]
    fn datetimes_use_the_payment_format() {
        let parsed = parse_datetime("2026-03-04 10:11:12").unwrap();

        assert_eq!(parsed.date(), date!(2026 - 03 - 04));
        assert_eq!(parsed.time(), time!(10:11:12));
        assert!(parse_datetime("2026-03-04").is_none());
    }
}
