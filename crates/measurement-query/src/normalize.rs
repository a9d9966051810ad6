//! Flattening of search engine responses into measurement records.
//!
//! Two response shapes carry the same information:
//!
//! - collapsed hits: `hits.hits[*]._source`, one hit per city;
//! - a `cities` terms aggregation whose buckets each hold a `by_top_hit`
//!   top-hits sub-aggregation with the representative document.
//!
//! Engine order is preserved as-is. Results are already sorted and
//! deduplicated by the engine, nothing is re-sorted here.

use serde::Deserialize;
use serde_json::Value;

use climate_common::{ClimateError, ClimateResult, Measurement};

use crate::response::{Bucket, Hit, HitList, SearchResponse};

/// Name of the per-city terms aggregation.
pub const CITIES_AGGREGATION: &str = "cities";

/// Name of the top-hits sub-aggregation inside each city bucket.
pub const TOP_HIT_AGGREGATION: &str = "by_top_hit";

/// Flatten either response shape into measurement records.
pub fn normalize(response: SearchResponse) -> ClimateResult<Vec<Measurement>> {
    let SearchResponse { hits, aggregations } = response;

    match aggregations.and_then(|mut aggs| aggs.remove(CITIES_AGGREGATION)) {
        Some(cities) => from_buckets(&cities.buckets),
        None => from_hits(&hits.hits),
    }
}

/// One record per hit, in hit order.
pub fn from_hits(hits: &[Hit]) -> ClimateResult<Vec<Measurement>> {
    hits.iter().map(hit_source).collect()
}

/// One record per bucket, in bucket order.
///
/// Only the first top hit of a bucket is used; `doc_count` is irrelevant.
pub fn from_buckets(buckets: &[Bucket]) -> ClimateResult<Vec<Measurement>> {
    buckets.iter().map(representative).collect()
}

fn representative(bucket: &Bucket) -> ClimateResult<Measurement> {
    #[derive(Deserialize)]
    struct TopHits {
        hits: HitList,
    }

    let top_hits = bucket
        .sub_aggregations
        .get(TOP_HIT_AGGREGATION)
        .ok_or_else(|| {
            ClimateError::MalformedResponse(format!(
                "bucket {} has no {} aggregation",
                bucket.key, TOP_HIT_AGGREGATION
            ))
        })?;

    let top_hits: TopHits = serde_json::from_value(top_hits.clone())?;
    let hit = top_hits.hits.hits.first().ok_or_else(|| {
        ClimateError::MalformedResponse(format!("bucket {} has no top hit", bucket.key))
    })?;

    hit_source(hit)
}

fn hit_source(hit: &Hit) -> ClimateResult<Measurement> {
    let source = hit.source.as_ref().ok_or_else(|| {
        ClimateError::MalformedResponse(format!(
            "hit {} has no _source",
            hit.id.as_deref().unwrap_or("<unknown>")
        ))
    })?;

    parse_source(source)
}

fn parse_source(source: &Value) -> ClimateResult<Measurement> {
    Measurement::deserialize(source).map_err(|e| {
        ClimateError::MalformedResponse(format!("unreadable measurement document: {}", e))
    })
}

/// A measurement together with where the engine keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMeasurement {
    pub index: String,
    pub id: String,
    pub measurement: Measurement,
}

/// Hits with their document coordinates, for read-modify-write.
pub fn stored_hits(response: &SearchResponse) -> ClimateResult<Vec<StoredMeasurement>> {
    response
        .hits
        .hits
        .iter()
        .map(|hit| {
            let (Some(index), Some(id)) = (hit.index.clone(), hit.id.clone()) else {
                return Err(ClimateError::MalformedResponse(
                    "hit without _index or _id".to_string(),
                ));
            };
            Ok(StoredMeasurement {
                index,
                id,
                measurement: hit_source(hit)?,
            })
        })
        .collect()
}
