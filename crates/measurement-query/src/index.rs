//! Selection of the yearly partitions a query has to touch.
//!
//! Measurements are stored one index per calendar year, named
//! `<prefix>-<YYYY>`. A date range maps to the ascending list of yearly
//! indexes it spans, or to the `<prefix>-*` wildcard when fully open.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use climate_common::DateRange;

/// Series prefix of the global land temperature indexes.
pub const DEFAULT_SERIES_PREFIX: &str = "global_land_temperatures_by_city";

/// Earliest day assumed when a range has no lower bound.
///
/// The dataset starts in the 1740s; 1500 keeps a wide margin.
pub fn earliest_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(1500, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Set of indexes a search is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSet {
    /// Every partition of the series.
    All { pattern: String },
    /// Explicit partitions in ascending year order.
    Partitions { names: Vec<String>, pattern: String },
}

impl IndexSet {
    /// Comma-joined target as sent to the engine.
    pub fn target(&self) -> String {
        match self {
            IndexSet::All { pattern } => pattern.clone(),
            IndexSet::Partitions { names, .. } => names.join(","),
        }
    }

    /// Wildcard pattern covering the whole series.
    pub fn pattern(&self) -> &str {
        match self {
            IndexSet::All { pattern } | IndexSet::Partitions { pattern, .. } => pattern,
        }
    }

    /// Explicit partition names, `None` for the wildcard.
    pub fn names(&self) -> Option<&[String]> {
        match self {
            IndexSet::All { .. } => None,
            IndexSet::Partitions { names, .. } => Some(names),
        }
    }

    /// True when no partition can hold matching documents.
    pub fn is_empty(&self) -> bool {
        matches!(self, IndexSet::Partitions { names, .. } if names.is_empty())
    }

    /// Whether the named index belongs to this set.
    pub fn matches(&self, index: &str) -> bool {
        match self {
            IndexSet::All { pattern } => {
                index.starts_with(pattern.trim_end_matches('*'))
            }
            IndexSet::Partitions { names, .. } => names.iter().any(|n| n == index),
        }
    }
}

impl fmt::Display for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target())
    }
}

/// Maps days and date ranges to partition names of one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSelector {
    prefix: String,
}

impl Default for IndexSelector {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_PREFIX)
    }
}

impl IndexSelector {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix>-*`
    pub fn wildcard(&self) -> String {
        format!("{}-*", self.prefix)
    }

    /// Partition holding documents of the given year.
    pub fn partition_for_year(&self, year: i32) -> String {
        format!("{}-{:04}", self.prefix, year)
    }

    /// Partition a measurement of `day` is written to.
    pub fn partition_for(&self, day: NaiveDate) -> String {
        self.partition_for_year(day.year())
    }

    /// Single-partition set for key lookups.
    pub fn partition_set(&self, day: NaiveDate) -> IndexSet {
        IndexSet::Partitions {
            names: vec![self.partition_for(day)],
            pattern: self.wildcard(),
        }
    }

    /// Partitions spanned by `range`.
    ///
    /// Years are enumerated by number only, so month and day of the bounds
    /// never matter. A missing lower bound starts at [`earliest_day`], a
    /// missing upper bound ends at `today`.
    pub fn select(&self, range: &DateRange, today: NaiveDate) -> IndexSet {
        if range.is_open() {
            return IndexSet::All {
                pattern: self.wildcard(),
            };
        }

        let (from, to) = range.resolve(earliest_day(), today);
        let names = (from.year()..=to.year())
            .map(|year| self.partition_for_year(year))
            .collect();

        IndexSet::Partitions {
            names,
            pattern: self.wildcard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn selector() -> IndexSelector {
        IndexSelector::new("prefix")
    }

    #[test]
    fn test_partition_for_day() {
        let selector = IndexSelector::default();
        assert_eq!(
            selector.partition_for(day(2019, 11, 29)),
            "global_land_temperatures_by_city-2019"
        );
    }

    #[test]
    fn test_partition_year_is_zero_padded() {
        assert_eq!(selector().partition_for_year(987), "prefix-0987");
    }

    #[test]
    fn test_open_range_uses_wildcard() {
        let set = selector().select(&DateRange::open(), day(2022, 1, 1));
        assert_eq!(set.target(), "prefix-*");
        assert!(set.names().is_none());
        assert!(!set.is_empty());
    }

    #[test]
    fn test_same_year() {
        let range = DateRange::new(Some(day(2019, 1, 1)), Some(day(2019, 5, 1))).unwrap();
        let set = selector().select(&range, day(2022, 1, 1));
        assert_eq!(set.target(), "prefix-2019");
    }

    #[test]
    fn test_multiple_years() {
        let range = DateRange::new(Some(day(2018, 1, 1)), Some(day(2020, 4, 7))).unwrap();
        let set = selector().select(&range, day(2022, 1, 1));
        assert_eq!(set.target(), "prefix-2018,prefix-2019,prefix-2020");
    }

    #[test]
    fn test_year_stepping_ignores_month_and_day() {
        let range = DateRange::new(Some(day(2018, 6, 30)), Some(day(2020, 1, 2))).unwrap();
        let set = selector().select(&range, day(2022, 1, 1));
        assert_eq!(set.target(), "prefix-2018,prefix-2019,prefix-2020");
    }

    #[test]
    fn test_leap_day_start() {
        let range = DateRange::new(Some(day(2016, 2, 29)), Some(day(2019, 3, 1))).unwrap();
        let set = selector().select(&range, day(2022, 1, 1));
        assert_eq!(set.names().unwrap().len(), 4);
    }

    #[test]
    fn test_missing_to_ends_today() {
        let range = DateRange::new(Some(day(2018, 1, 1)), None).unwrap();
        let set = selector().select(&range, day(2022, 2, 3));
        assert_eq!(
            set.target(),
            "prefix-2018,prefix-2019,prefix-2020,prefix-2021,prefix-2022"
        );
    }

    #[test]
    fn test_missing_from_starts_far_past() {
        let range = DateRange::new(None, Some(day(2018, 1, 1))).unwrap();
        let set = selector().select(&range, day(2022, 2, 3));
        let names = set.names().unwrap();
        assert_eq!(names.len(), 2018 - 1500 + 1);
        assert_eq!(names.first().unwrap(), "prefix-1500");
        assert_eq!(names.last().unwrap(), "prefix-2018");
    }

    #[test]
    fn test_from_after_today_is_empty() {
        let range = DateRange::new(Some(day(2030, 1, 1)), None).unwrap();
        let set = selector().select(&range, day(2022, 2, 3));
        assert!(set.is_empty());
        assert_eq!(set.pattern(), "prefix-*");
    }

    #[test]
    fn test_matches() {
        let all = IndexSet::All {
            pattern: "prefix-*".to_string(),
        };
        assert!(all.matches("prefix-2019"));
        assert!(!all.matches("other-2019"));

        let set = selector().partition_set(day(2019, 5, 1));
        assert!(set.matches("prefix-2019"));
        assert!(!set.matches("prefix-2018"));
    }
}
