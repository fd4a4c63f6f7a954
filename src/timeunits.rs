//! # CF Time Units
//!
//! Parsing of CF-convention time encodings (`"<unit> since <reference time>"`)
//! and conversion between absolute instants and the encoded numeric scale
//! stored in time coordinate variables.
//!
//! ```rust
//! use ncband::timeunits::TimeEncoding;
//!
//! let encoding = TimeEncoding::parse("seconds since 1970-01-01 00:00", None)?;
//! let instant = encoding.decode(1560621600.0)?;
//! assert_eq!(instant.to_rfc3339(), "2019-06-15T18:00:00+00:00");
//! assert_eq!(encoding.encode(instant), 1560621600.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while interpreting time encoding attributes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeUnitsError {
    #[error("Invalid time units '{0}'")]
    InvalidUnits(String),

    #[error("Invalid reference time in units '{0}'")]
    InvalidEpoch(String),

    #[error("Unsupported calendar '{0}'")]
    UnsupportedCalendar(String),

    #[error("Time value {0} is out of range")]
    OutOfRange(f64),
}

/// Step size of an encoded time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "microseconds" | "microsecond" | "us" | "usec" | "usecs" => Some(TimeUnit::Microseconds),
            "milliseconds" | "millisecond" | "ms" | "msec" | "msecs" => Some(TimeUnit::Milliseconds),
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(TimeUnit::Hours),
            "days" | "day" | "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    fn microseconds(self) -> f64 {
        match self {
            TimeUnit::Microseconds => 1.0,
            TimeUnit::Milliseconds => 1_000.0,
            TimeUnit::Seconds => 1_000_000.0,
            TimeUnit::Minutes => 60_000_000.0,
            TimeUnit::Hours => 3_600_000_000.0,
            TimeUnit::Days => 86_400_000_000.0,
        }
    }
}

/// Encoding of a time coordinate variable: a unit and a reference instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeEncoding {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
    /// The `units` attribute as stored in the file
    pub units: String,
}

impl TimeEncoding {
    /// Parses a `units` attribute, checking the optional `calendar` attribute.
    ///
    /// Only calendars equivalent to the proleptic Gregorian calendar for
    /// modern dates are accepted.
    pub fn parse(units: &str, calendar: Option<&str>) -> Result<Self, TimeUnitsError> {
        if let Some(calendar) = calendar {
            match calendar.trim().to_ascii_lowercase().as_str() {
                "" | "standard" | "gregorian" | "proleptic_gregorian" => {}
                _ => return Err(TimeUnitsError::UnsupportedCalendar(calendar.to_string())),
            }
        }

        let (unit_token, rest) = units
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| TimeUnitsError::InvalidUnits(units.to_string()))?;
        let unit = TimeUnit::parse(unit_token)
            .ok_or_else(|| TimeUnitsError::InvalidUnits(units.to_string()))?;

        let rest = rest.trim_start();
        let epoch_text = rest
            .get(..5)
            .filter(|word| word.eq_ignore_ascii_case("since"))
            .map(|_| &rest[5..])
            .ok_or_else(|| TimeUnitsError::InvalidUnits(units.to_string()))?;
        let epoch = parse_reference_time(epoch_text)
            .ok_or_else(|| TimeUnitsError::InvalidEpoch(units.to_string()))?;

        Ok(TimeEncoding {
            unit,
            epoch,
            units: units.to_string(),
        })
    }

    /// Converts an absolute instant into this encoding's numeric scale.
    pub fn encode(&self, instant: DateTime<Utc>) -> f64 {
        let delta = instant.signed_duration_since(self.epoch);
        let micros = delta
            .num_microseconds()
            .map(|us| us as f64)
            .unwrap_or_else(|| delta.num_milliseconds() as f64 * 1_000.0);
        micros / self.unit.microseconds()
    }

    /// Converts an encoded value back into an absolute instant.
    pub fn decode(&self, value: f64) -> Result<DateTime<Utc>, TimeUnitsError> {
        let micros = value * self.unit.microseconds();
        if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
            return Err(TimeUnitsError::OutOfRange(value));
        }
        self.epoch
            .checked_add_signed(Duration::microseconds(micros.round() as i64))
            .ok_or(TimeUnitsError::OutOfRange(value))
    }
}

/// Formats an instant the way band metadata carries it (`time_iso_8601`).
pub fn iso_8601(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn parse_reference_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let text = text.strip_suffix("UTC").map(str::trim_end).unwrap_or(text);
    let text = text.strip_suffix('Z').unwrap_or(text);

    for format in [
        "%Y-%m-%d %H:%M:%S%.f %:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f %z",
    ] {
        if let Ok(parsed) = DateTime::parse_from_str(text, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    let mut normalized = text.replacen('T', " ", 1);
    if let Some((_, clock)) = normalized.split_once(' ') {
        // "1970-01-01 00" carries the hour only
        if !clock.is_empty() && clock.chars().all(|c| c.is_ascii_digit()) {
            normalized.push_str(":00");
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
