//! Tests for parsing query date ranges.

use chrono::NaiveDate;
use climate_common::{ClimateError, DateRange};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Open and one-sided ranges
// ============================================================================

#[test]
fn test_absent_bounds_give_open_range() {
    let range = DateRange::parse(None, None).unwrap();
    assert!(range.is_open());
    assert_eq!(range, DateRange::open());
}

#[test]
fn test_empty_bounds_are_treated_as_absent() {
    let range = DateRange::parse(Some(""), Some("")).unwrap();
    assert!(range.is_open());
}

#[test]
fn test_only_from() {
    let range = DateRange::parse(Some("2018-01-01"), None).unwrap();
    assert_eq!(range.from, Some(day(2018, 1, 1)));
    assert_eq!(range.to, None);
    assert!(!range.is_open());
}

#[test]
fn test_only_to() {
    let range = DateRange::parse(None, Some("2018-01-01")).unwrap();
    assert_eq!(range.from, None);
    assert_eq!(range.to, Some(day(2018, 1, 1)));
}

// ============================================================================
// Bounded ranges
// ============================================================================

#[test]
fn test_bounded_range() {
    let range = DateRange::parse(Some("2018-01-01"), Some("2020-04-07")).unwrap();
    assert_eq!(range.from, Some(day(2018, 1, 1)));
    assert_eq!(range.to, Some(day(2020, 4, 7)));
}

#[test]
fn test_single_day_range() {
    let range = DateRange::parse(Some("2019-05-01"), Some("2019-05-01")).unwrap();
    assert_eq!(range.from, range.to);
}

#[test]
fn test_reversed_range_is_rejected() {
    let err = DateRange::parse(Some("2020-02-28"), Some("2019-05-01")).unwrap_err();
    assert_eq!(err, ClimateError::InvalidRange);
    assert_eq!(err.http_status_code(), 400);
}

// ============================================================================
// Malformed bounds
// ============================================================================

#[test]
fn test_impossible_from_date() {
    let err = DateRange::parse(Some("2019-02-30"), Some("2019-05-01")).unwrap_err();
    assert_eq!(err, ClimateError::invalid_date("from", "2019-02-30"));
}

#[test]
fn test_garbage_from_date() {
    let err = DateRange::parse(Some("xxxxx"), Some("2020-04-07")).unwrap_err();
    assert_eq!(err, ClimateError::invalid_date("from", "xxxxx"));
    assert_eq!(err.to_string(), "Invalid date format for from: xxxxx");
}

#[test]
fn test_garbage_to_date() {
    let err = DateRange::parse(Some("2020-04-07"), Some("07/04/2020")).unwrap_err();
    assert_eq!(err, ClimateError::invalid_date("to", "07/04/2020"));
}

#[test]
fn test_malformed_bound_reported_before_ordering() {
    let err = DateRange::parse(Some("2021-01-01"), Some("2020-1-1")).unwrap_err();
    assert!(matches!(err, ClimateError::InvalidDate { ref field, .. } if field == "to"));
}
