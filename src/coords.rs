//! # Coordinate Selections
//!
//! Requested coordinate values and the nearest-match search used to turn
//! them into indices along a dimension.
//!
//! A [`CoordinateSelection`] is a partial mapping from dimension name to a
//! [`CoordinateValue`]. Dimensions it does not mention resolve to index 0,
//! and names that match no dimension of the variable are ignored.
//!
//! ```rust
//! use ncband::coords::{CoordinateSelection, CoordinateValue, nearest_index};
//!
//! let mut selection = CoordinateSelection::new();
//! selection.insert("pressure", CoordinateValue::Numeric(500.0));
//! selection.insert("time", "2019-06-15T18:00".parse::<CoordinateValue>()?);
//! assert_eq!(selection.len(), 2);
//!
//! let pressures = [200.0, 250.0, 300.0, 400.0, 500.0, 700.0, 800.0];
//! assert_eq!(nearest_index(&pressures, 500.0), Some(4));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A requested position along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub enum CoordinateValue {
    /// A value on the dimension's own numeric scale
    Numeric(f64),
    /// An absolute instant, only meaningful for time dimensions
    Instant(DateTime<Utc>),
}

/// Config files carry numbers or ISO strings
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl TryFrom<RawCoordinate> for CoordinateValue {
    type Error = String;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        match raw {
            RawCoordinate::Number(value) => Ok(CoordinateValue::Numeric(value)),
            RawCoordinate::Text(text) => text.parse(),
        }
    }
}

impl Serialize for CoordinateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CoordinateValue::Numeric(value) => serializer.serialize_f64(*value),
            CoordinateValue::Instant(instant) => serializer.serialize_str(&instant.to_rfc3339()),
        }
    }
}

impl FromStr for CoordinateValue {
    type Err = String;

    /// Numbers parse as [`CoordinateValue::Numeric`], ISO-8601 dates and
    /// date-times as [`CoordinateValue::Instant`] (UTC unless an offset is given).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<f64>() {
            if value.is_nan() {
                return Err(format!("Invalid coordinate value '{}': NaN matches no coordinate", s));
            }
            return Ok(CoordinateValue::Numeric(value));
        }
        parse_instant(s)
            .map(CoordinateValue::Instant)
            .ok_or_else(|| format!("Invalid coordinate value '{}': expected a number or an ISO-8601 time", s))
    }
}

impl fmt::Display for CoordinateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateValue::Numeric(value) => write!(f, "{}", value),
            CoordinateValue::Instant(instant) => write!(f, "{}", instant.to_rfc3339()),
        }
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }
    let s = s.strip_suffix('Z').unwrap_or(s);
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Caller-supplied partial mapping from dimension name to requested value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateSelection {
    values: BTreeMap<String, CoordinateValue>,
}

impl CoordinateSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dimension: impl Into<String>, value: CoordinateValue) -> Option<CoordinateValue> {
        self.values.insert(dimension.into(), value)
    }

    pub fn with(mut self, dimension: impl Into<String>, value: CoordinateValue) -> Self {
        self.insert(dimension, value);
        self
    }

    pub fn get(&self, dimension: &str) -> Option<&CoordinateValue> {
        self.values.get(dimension)
    }

    /// Entries of `other` replace entries of `self` with the same name.
    pub fn merge(&mut self, other: &CoordinateSelection) {
        for (name, value) in other.iter() {
            self.values.insert(name.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CoordinateValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, CoordinateValue)> for CoordinateSelection {
    fn from_iter<I: IntoIterator<Item = (S, CoordinateValue)>>(iter: I) -> Self {
        CoordinateSelection {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// How a coordinate variable stores its values on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StorageKind {
    Integer,
    Float32,
    #[default]
    Float64,
}

/// Index of the coordinate closest to `query`.
///
/// Equal distances resolve to the lower index, so a query outside the stored
/// range lands on the nearest boundary. An infinite query lands on the first
/// largest (or smallest) coordinate. NaN coordinates never match. Returns
/// `None` for a NaN query or when no coordinate is a number.
pub fn nearest_index(coordinates: &[f64], query: f64) -> Option<usize> {
    if query.is_nan() {
        return None;
    }
    if query.is_infinite() {
        return extreme_index(coordinates, query > 0.0);
    }
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in coordinates.iter().enumerate() {
        let distance = (value - query).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

fn extreme_index(coordinates: &[f64], largest: bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in coordinates.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if (largest && value <= current) || (!largest && value >= current) => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Formats a coordinate value as the dimension's native representation.
///
/// Integer coordinate variables print without a fraction (`"200"`). Float
/// ones print in the shortest form that round-trips at their stored width,
/// so a float32 `0.1` prints `"0.1"` rather than its widened f64 digits.
pub fn format_native(value: f64, storage: StorageKind) -> String {
    match storage {
        StorageKind::Integer if value.is_finite() => format!("{}", value.round() as i64),
        StorageKind::Float32 => format!("{}", value as f32),
        _ => format!("{}", value),
    }
}
