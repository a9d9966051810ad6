//! Calendar day handling for measurements and query ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ClimateError, ClimateResult};

/// Format of a calendar day on the wire (`YYYY-MM-DD`).
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Format the search engine stores days in (midnight timestamp).
pub const STORED_DAY_FORMAT: &str = "%Y-%m-%dT00:00:00";

/// Parse a strict `YYYY-MM-DD` calendar day.
///
/// Rejects anything that is not exactly four digits, two digits and two
/// digits separated by dashes, and anything that is not a real date
/// (`2019-02-30`).
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return None;
    }

    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }

    NaiveDate::parse_from_str(s, DAY_FORMAT).ok()
}

/// Inclusive date range with optional bounds.
///
/// A missing bound means the range is unbounded in that direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range, rejecting `from > to`.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ClimateResult<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ClimateError::InvalidRange);
            }
        }
        Ok(Self { from, to })
    }

    /// Fully open range.
    pub fn open() -> Self {
        Self::default()
    }

    /// Parse the raw `from`/`to` query values.
    ///
    /// Absent and empty values leave the bound unset. Each bound is checked
    /// before ordering, so a malformed `from` is reported even when `to`
    /// would also be rejected.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> ClimateResult<Self> {
        let from = parse_bound("from", from)?;
        let to = parse_bound("to", to)?;
        Self::new(from, to)
    }

    /// True when neither bound is set.
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Resolve missing bounds to concrete dates.
    pub fn resolve(&self, earliest: NaiveDate, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (self.from.unwrap_or(earliest), self.to.unwrap_or(today))
    }

    /// Whether `day` falls within the range (bounds inclusive).
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

fn parse_bound(field: &str, raw: Option<&str>) -> ClimateResult<Option<NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_day(s)
            .map(Some)
            .ok_or_else(|| ClimateError::invalid_date(field, s)),
    }
}

/// Serde adapter for measurement days.
///
/// Serializes as the stored midnight timestamp and accepts either a plain
/// day or any timestamp whose date part is a strict day.
pub mod day_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{parse_day, STORED_DAY_FORMAT};

    pub fn serialize<S>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&day.format(STORED_DAY_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_stored_day(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid day: {}", raw)))
    }

    /// Parse `YYYY-MM-DD` optionally followed by a `T...` time part.
    pub fn parse_stored_day(raw: &str) -> Option<NaiveDate> {
        match raw.get(..10) {
            Some(date) if raw.len() == 10 || raw[10..].starts_with('T') => parse_day(date),
            _ => None,
        }
    }
}
