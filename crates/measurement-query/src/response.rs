//! Search engine response types.
//!
//! Only the parts the services read are modelled; everything else in the
//! engine's response (`took`, `_shards`, scores, sort values) is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: HitList,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<HashMap<String, BucketAggregation>>,
}

impl SearchResponse {
    /// Hit-shaped response.
    pub fn from_hits(hits: Vec<Hit>) -> Self {
        Self {
            hits: HitList { hits },
            aggregations: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitList {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One matched document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

/// Bucket aggregation result (`terms` and friends).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketAggregation {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// One group of documents sharing a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: Value,

    #[serde(default)]
    pub doc_count: u64,

    /// Sub-aggregation results by name
    #[serde(flatten)]
    pub sub_aggregations: Map<String, Value>,
}
