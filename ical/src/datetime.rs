// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! DATE and DATE-TIME value parsing and formatting.
//!
//! Timezone policy: values with a `TZID` parameter or floating local times
//! are interpreted as UTC. The VTIMEZONE block, when present, rides along
//! untouched in the raw object; resolving it is out of scope.

use jiff::Timestamp;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;

use crate::error::IcalError;
use crate::line::ContentLine;

const FMT_DATE: &str = "%Y%m%d";
const FMT_DATETIME: &str = "%Y%m%dT%H%M%S";
const FMT_DATETIME_UTC: &str = "%Y%m%dT%H%M%SZ";

/// Parses the value of a DTSTART/DTEND-style property.
///
/// Returns the instant plus whether the value was a bare DATE (the all-day
/// marker). DATE values map to midnight UTC of that day.
///
/// # Errors
///
/// Returns [`IcalError::InvalidDateTime`] for values in neither DATE nor
/// DATE-TIME syntax.
pub fn parse_dt(line: &ContentLine) -> Result<(Timestamp, bool), IcalError> {
    let value = line.value.trim();
    let is_date = line.param("VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || (value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()));

    if is_date {
        let date = parse_date(value)?;
        return Ok((date_to_timestamp(date)?, true));
    }

    let civil = if let Some(stripped) = value.strip_suffix('Z') {
        DateTime::strptime(FMT_DATETIME, stripped)
    } else {
        DateTime::strptime(FMT_DATETIME, value)
    };
    let civil = civil.map_err(|e| IcalError::InvalidDateTime {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    let zoned = civil
        .to_zoned(TimeZone::UTC)
        .map_err(|e| IcalError::InvalidDateTime {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    Ok((zoned.timestamp(), false))
}

/// Parses a bare `YYYYMMDD` DATE value.
///
/// # Errors
///
/// Returns [`IcalError::InvalidDateTime`] when the value is not a calendar
/// date.
pub fn parse_date(value: &str) -> Result<Date, IcalError> {
    Date::strptime(FMT_DATE, value).map_err(|e| IcalError::InvalidDateTime {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Midnight UTC of the given civil date.
///
/// # Errors
///
/// Returns [`IcalError::InvalidDateTime`] if the date is outside the
/// representable range.
pub fn date_to_timestamp(date: Date) -> Result<Timestamp, IcalError> {
    date.to_zoned(TimeZone::UTC)
        .map(|z| z.timestamp())
        .map_err(|e| IcalError::InvalidDateTime {
            value: date.to_string(),
            reason: e.to_string(),
        })
}

/// Formats an instant as a UTC DATE-TIME (`YYYYMMDDTHHMMSSZ`).
#[must_use]
pub fn format_utc(ts: Timestamp) -> String {
    ts.to_zoned(TimeZone::UTC)
        .strftime(FMT_DATETIME_UTC)
        .to_string()
}

/// Formats the UTC calendar date of an instant (`YYYYMMDD`).
#[must_use]
pub fn format_date(ts: Timestamp) -> String {
    ts.to_zoned(TimeZone::UTC).strftime(FMT_DATE).to_string()
}

/// The UTC calendar date of an instant.
#[must_use]
pub fn utc_date(ts: Timestamp) -> Date {
    ts.to_zoned(TimeZone::UTC).date()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> ContentLine {
        ContentLine::parse(s).unwrap()
    }

    #[test]
    fn parses_utc_datetime() {
        let (ts, all_day) = parse_dt(&line("DTSTART:20250601T090000Z")).unwrap();
        assert!(!all_day);
        assert_eq!(format_utc(ts), "20250601T090000Z");
    }

    #[test]
    fn parses_date_value_as_all_day() {
        let (ts, all_day) = parse_dt(&line("DTSTART;VALUE=DATE:20250601")).unwrap();
        assert!(all_day);
        assert_eq!(format_date(ts), "20250601");
        assert_eq!(format_utc(ts), "20250601T000000Z");
    }

    #[test]
    fn detects_all_day_from_bare_date_without_value_param() {
        let (_, all_day) = parse_dt(&line("DTEND:20250602")).unwrap();
        assert!(all_day);
    }

    #[test]
    fn treats_tzid_value_as_utc_passthrough() {
        let (ts, all_day) = parse_dt(&line("DTSTART;TZID=Europe/Berlin:20250601T090000")).unwrap();
        assert!(!all_day);
        assert_eq!(format_utc(ts), "20250601T090000Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_dt(&line("DTSTART:not-a-date")).is_err());
    }
}
