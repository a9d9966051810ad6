//! Search request construction.
//!
//! Requests serialize to the engine's query DSL. The listing request
//! collapses on `city`, sorts by `average_temperature` descending and
//! optionally filters `day` by the caller's range:
//!
//! ```json
//! {
//!   "collapse": {"field": "city"},
//!   "sort": [{"average_temperature": "desc"}],
//!   "size": 10,
//!   "query": {"range": {"day": {"gte": "2018-01-01", "lte": "2020-04-07"}}}
//! }
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use climate_common::{DateRange, DAY_FORMAT};

use crate::fields;

/// Structured search request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<Collapse>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,

    pub size: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
}

/// Keep only the top document per distinct field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collapse {
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One sort key, serialized as `{"<field>": "<order>"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

impl Serialize for SortClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.order)?;
        map.end()
    }
}

/// Inclusive bounds of a range query, formatted as days.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RangeBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
}

/// Filter context of a bool query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoolQuery {
    pub filter: Vec<Query>,
}

/// Subset of the query DSL the services use.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Query {
    Range(BTreeMap<String, RangeBounds>),
    Term(BTreeMap<String, String>),
    Bool(BoolQuery),
}

impl Query {
    /// Range filter on `day` from the bounds the caller actually supplied.
    ///
    /// Returns `None` for an open range. Bounds substituted for partition
    /// selection must never reach this filter, otherwise one-sided ranges
    /// would exclude documents they should match.
    pub fn day_range(range: &DateRange) -> Option<Self> {
        if range.is_open() {
            return None;
        }

        let bounds = RangeBounds {
            gte: range.from.map(format_day),
            lte: range.to.map(format_day),
        };
        Some(Query::Range(BTreeMap::from([(
            fields::DAY.to_string(),
            bounds,
        )])))
    }

    /// Exact match on a keyword field.
    pub fn term(field: &str, value: impl Into<String>) -> Self {
        Query::Term(BTreeMap::from([(field.to_string(), value.into())]))
    }
}

fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

impl SearchRequest {
    /// Hottest `limit` cities, one document per city, within `range`.
    pub fn top_cities(limit: usize, range: &DateRange) -> Self {
        Self {
            collapse: Some(Collapse {
                field: fields::CITY.to_string(),
            }),
            sort: vec![SortClause {
                field: fields::AVERAGE_TEMPERATURE.to_string(),
                order: SortOrder::Desc,
            }],
            size: limit,
            query: Query::day_range(range),
        }
    }

    /// Lookup of the measurement identified by `(city, day)`.
    ///
    /// Asks for two hits so duplicates of the key can be detected.
    pub fn by_key(city: &str, day: NaiveDate) -> Self {
        Self {
            collapse: None,
            sort: Vec::new(),
            size: 2,
            query: Some(Query::Bool(BoolQuery {
                filter: vec![
                    Query::term(fields::CITY, city),
                    Query::term(fields::DAY, format_day(day)),
                ],
            })),
        }
    }
}
