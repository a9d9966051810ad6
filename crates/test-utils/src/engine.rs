//! In-memory search engine.
//!
//! Evaluates the part of the query DSL the services build (term, range and
//! bool filters, a single sort key, collapse on a keyword field) against a
//! document list, and records every search it receives so tests can assert
//! on the exact request.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use climate_common::{parse_day, ClimateError, ClimateResult, Measurement, DAY_FORMAT};
use measurement_query::search::{RangeBounds, SortClause};
use measurement_query::{
    fields, Hit, IndexSelector, IndexSet, Query, SearchRequest, SearchResponse, SortOrder,
};
use search_client::{BulkItem, BulkSummary, SearchEngine};

/// A document as held by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub index: String,
    pub id: String,
    pub routing: String,
    pub measurement: Measurement,
}

/// A search the engine received.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    /// Index target as it would appear in the request path
    pub indexes: String,
    pub request: SearchRequest,
    pub routing: Option<String>,
}

#[derive(Debug, Default)]
struct EngineState {
    documents: Vec<StoredDocument>,
    searches: Vec<SearchCall>,
    templates: Vec<(String, Value)>,
    canned: Option<SearchResponse>,
    failure: Option<ClimateError>,
    next_id: u64,
}

impl EngineState {
    fn check_failure(&self) -> ClimateResult<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn store(&mut self, index: &str, id: Option<&str>, measurement: &Measurement) -> String {
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                self.next_id += 1;
                format!("doc-{}", self.next_id)
            }
        };

        let document = StoredDocument {
            index: index.to_string(),
            id: id.clone(),
            routing: measurement.city.clone(),
            measurement: measurement.clone(),
        };

        match self
            .documents
            .iter_mut()
            .find(|d| d.index == index && d.id == id)
        {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
        id
    }
}

/// Search engine double backed by a `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    state: Mutex<EngineState>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine holding `measurements`, each in its yearly partition of `prefix`.
    pub fn seeded(prefix: &str, measurements: impl IntoIterator<Item = Measurement>) -> Self {
        let engine = Self::new();
        let selector = IndexSelector::new(prefix);
        for measurement in measurements {
            engine.insert(&selector.partition_for(measurement.day), measurement);
        }
        engine
    }

    /// Store a document directly, returning its id.
    pub fn insert(&self, index: &str, measurement: Measurement) -> String {
        self.lock().store(index, None, &measurement)
    }

    /// Answer every search with `response` instead of evaluating it.
    pub fn respond_with(&self, response: SearchResponse) {
        self.lock().canned = Some(response);
    }

    /// Make every operation fail with `err` until cleared with `None`.
    pub fn fail_with(&self, err: Option<ClimateError>) {
        self.lock().failure = err;
    }

    /// Behave like an engine that cannot be reached.
    pub fn go_down(&self) {
        self.fail_with(Some(ClimateError::UpstreamUnavailable(
            "connection refused".to_string(),
        )));
    }

    pub fn documents(&self) -> Vec<StoredDocument> {
        self.lock().documents.clone()
    }

    pub fn searches(&self) -> Vec<SearchCall> {
        self.lock().searches.clone()
    }

    pub fn templates(&self) -> Vec<(String, Value)> {
        self.lock().templates.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EngineState> {
        // A panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn day_matches_bound(day: NaiveDate, bound: &Option<String>, keep: fn(Ordering) -> bool) -> bool {
    match bound.as_deref().and_then(parse_day) {
        Some(limit) => keep(day.cmp(&limit)),
        None => bound.is_none(),
    }
}

fn range_matches(measurement: &Measurement, field: &str, bounds: &RangeBounds) -> bool {
    if field != fields::DAY {
        return false;
    }
    day_matches_bound(measurement.day, &bounds.gte, |o| o != Ordering::Less)
        && day_matches_bound(measurement.day, &bounds.lte, |o| o != Ordering::Greater)
}

fn term_matches(measurement: &Measurement, field: &str, value: &str) -> bool {
    match field {
        f if f == fields::CITY => measurement.city == value,
        f if f == fields::COUNTRY => measurement.country == value,
        f if f == fields::DAY => measurement.day.format(DAY_FORMAT).to_string() == value,
        _ => false,
    }
}

fn query_matches(query: &Query, measurement: &Measurement) -> bool {
    match query {
        Query::Range(ranges) => ranges
            .iter()
            .all(|(field, bounds)| range_matches(measurement, field, bounds)),
        Query::Term(terms) => terms
            .iter()
            .all(|(field, value)| term_matches(measurement, field, value)),
        Query::Bool(bool_query) => bool_query
            .filter
            .iter()
            .all(|q| query_matches(q, measurement)),
    }
}

fn sort_key(measurement: &Measurement, field: &str) -> Option<f64> {
    match field {
        f if f == fields::AVERAGE_TEMPERATURE => measurement.average_temperature,
        f if f == fields::AVERAGE_TEMPERATURE_UNCERTAINTY => {
            measurement.average_temperature_uncertainty
        }
        f if f == fields::DAY => Some(f64::from(measurement.day.num_days_from_ce())),
        _ => None,
    }
}

/// Documents without a value sort last in either direction.
fn compare(a: &Measurement, b: &Measurement, clause: &SortClause) -> Ordering {
    match (sort_key(a, &clause.field), sort_key(b, &clause.field)) {
        (Some(x), Some(y)) => {
            let ordering = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match clause.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn collapse_key(measurement: &Measurement, field: &str) -> Option<String> {
    match field {
        f if f == fields::CITY => Some(measurement.city.clone()),
        f if f == fields::COUNTRY => Some(measurement.country.clone()),
        _ => None,
    }
}

fn evaluate(
    documents: &[StoredDocument],
    indexes: &IndexSet,
    request: &SearchRequest,
    routing: Option<&str>,
) -> ClimateResult<SearchResponse> {
    let mut matched: Vec<&StoredDocument> = documents
        .iter()
        .filter(|d| indexes.matches(&d.index))
        .filter(|d| routing.map_or(true, |r| d.routing == r))
        .filter(|d| {
            request
                .query
                .as_ref()
                .map_or(true, |q| query_matches(q, &d.measurement))
        })
        .collect();

    matched.sort_by(|a, b| {
        request
            .sort
            .iter()
            .map(|clause| compare(&a.measurement, &b.measurement, clause))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    if let Some(collapse) = &request.collapse {
        let mut seen = HashSet::new();
        matched.retain(|d| match collapse_key(&d.measurement, &collapse.field) {
            Some(key) => seen.insert(key),
            None => true,
        });
    }
    matched.truncate(request.size);

    let hits = matched
        .into_iter()
        .map(|d| {
            Ok(Hit {
                index: Some(d.index.clone()),
                id: Some(d.id.clone()),
                source: Some(serde_json::to_value(&d.measurement)?),
            })
        })
        .collect::<ClimateResult<Vec<_>>>()?;

    Ok(SearchResponse::from_hits(hits))
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    async fn search(
        &self,
        indexes: &IndexSet,
        request: &SearchRequest,
        routing: Option<&str>,
    ) -> ClimateResult<SearchResponse> {
        let mut state = self.lock();
        state.check_failure()?;
        state.searches.push(SearchCall {
            indexes: indexes.target(),
            request: request.clone(),
            routing: routing.map(str::to_string),
        });

        if let Some(canned) = &state.canned {
            return Ok(canned.clone());
        }
        evaluate(&state.documents, indexes, request, routing)
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        measurement: &Measurement,
    ) -> ClimateResult<String> {
        let mut state = self.lock();
        state.check_failure()?;
        Ok(state.store(index, id, measurement))
    }

    async fn bulk_index(&self, items: &[BulkItem]) -> ClimateResult<BulkSummary> {
        let mut state = self.lock();
        state.check_failure()?;
        for item in items {
            state.store(&item.index, None, &item.measurement);
        }
        Ok(BulkSummary {
            indexed: items.len(),
            ..BulkSummary::default()
        })
    }

    async fn put_index_template(&self, name: &str, template: &Value) -> ClimateResult<()> {
        let mut state = self.lock();
        state.check_failure()?;
        state.templates.push((name.to_string(), template.clone()));
        Ok(())
    }

    async fn ping(&self) -> ClimateResult<()> {
        self.lock().check_failure()
    }
}
