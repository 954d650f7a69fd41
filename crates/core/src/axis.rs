//! Axis domain adapter: numeric vs. time-based axis values and their wire encoding.
//!
//! The wire side is always a number. Time-based values travel as milliseconds since
//! the Unix epoch; naive timestamps are read as UTC so encoding never depends on the
//! host timezone.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

pub const MILLIS_PER_SECOND: i64 = 1_000;

/// Formats accepted for timestamp strings, tried after RFC 3339.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Whether axis samples are plain numbers or calendar timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisDomain {
    Numeric,
    Temporal,
}

impl AxisDomain {
    /// Inspect the first sample only. An empty axis has no domain.
    pub fn detect(samples: &[AxisValue]) -> Option<AxisDomain> {
        samples.first().map(AxisValue::domain)
    }
}

/// A single position on the x-axis.
///
/// Values from different domains are unordered with respect to each other, so a
/// numeric bound never contains a timestamp sample (and vice versa).
///
/// Serialized untagged: a number, or an ISO timestamp string. Reading back accepts
/// every string form [`parse_timestamp`] does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Time(NaiveDateTime),
}

struct AxisValueVisitor;

impl<'de> Visitor<'de> for AxisValueVisitor {
    type Value = AxisValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a timestamp string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<AxisValue, E> {
        Ok(AxisValue::Number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<AxisValue, E> {
        Ok(AxisValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<AxisValue, E> {
        Ok(AxisValue::Number(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<AxisValue, E> {
        parse_timestamp(v).map(AxisValue::Time).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for AxisValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AxisValueVisitor)
    }
}

impl PartialOrd for AxisValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (AxisValue::Number(a), AxisValue::Number(b)) => a.partial_cmp(b),
            (AxisValue::Time(a), AxisValue::Time(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<f64> for AxisValue {
    fn from(v: f64) -> Self {
        AxisValue::Number(v)
    }
}

impl From<NaiveDateTime> for AxisValue {
    fn from(v: NaiveDateTime) -> Self {
        AxisValue::Time(v)
    }
}

impl AxisValue {
    pub fn domain(&self) -> AxisDomain {
        match self {
            AxisValue::Number(_) => AxisDomain::Numeric,
            AxisValue::Time(_) => AxisDomain::Temporal,
        }
    }

    /// Wire encoding: identity for numbers, whole milliseconds since epoch for timestamps.
    pub fn to_wire(&self) -> f64 {
        match self {
            AxisValue::Number(n) => *n,
            AxisValue::Time(t) => t.and_utc().timestamp_millis() as f64,
        }
    }

    /// Decode a wire number for the given domain. Numbers stay numbers unless the
    /// domain is temporal; `None` when the milliseconds fall outside chrono's range.
    pub fn from_wire(raw: f64, domain: Option<AxisDomain>) -> Option<AxisValue> {
        match domain {
            Some(AxisDomain::Temporal) => time_from_millis(raw).map(AxisValue::Time),
            _ => Some(AxisValue::Number(raw)),
        }
    }

    /// Decode a JSON sample: numbers as-is, strings as timestamps.
    pub fn from_json(v: &Json) -> Option<AxisValue> {
        match v {
            Json::Number(n) => n.as_f64().map(AxisValue::Number),
            Json::String(s) => parse_timestamp(s).map(AxisValue::Time),
            _ => None,
        }
    }

    /// Render as a chart sample (timestamps as ISO strings, non-finite numbers as null).
    pub fn to_json(&self) -> Json {
        match self {
            AxisValue::Number(n) => serde_json::Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
            AxisValue::Time(t) => Json::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AxisValue::Number(n) => Some(*n),
            AxisValue::Time(_) => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            AxisValue::Time(t) => Some(*t),
            AxisValue::Number(_) => None,
        }
    }
}

/// Milliseconds since epoch to a naive UTC timestamp; sub-millisecond digits are dropped.
pub fn time_from_millis(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64).map(|dt| dt.naive_utc())
}

/// Parse RFC 3339, ISO-like `YYYY-MM-DD[ T]HH:MM:SS[.fff]` or a bare date.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// The sampled x-axis of a chart.
///
/// `indexed` marks samples that come from a real series container (a frame column);
/// a bare list lifted out of chart JSON is not indexed and gets no derived series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axis {
    pub values: Vec<AxisValue>,
    pub indexed: bool,
}

impl Axis {
    pub fn indexed(values: Vec<AxisValue>) -> Self {
        Self { values, indexed: true }
    }

    pub fn bare(values: Vec<AxisValue>) -> Self {
        Self { values, indexed: false }
    }

    pub fn domain(&self) -> Option<AxisDomain> {
        AxisDomain::detect(&self.values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
