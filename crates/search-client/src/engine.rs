//! The search engine seam.
//!
//! Services receive an `Arc<dyn SearchEngine>` at construction; the HTTP
//! implementation lives in [`crate::elasticsearch`], tests substitute an
//! in-memory engine.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use climate_common::{ClimateResult, Measurement};
use measurement_query::{IndexSet, SearchRequest, SearchResponse};

/// One document of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    pub index: String,
    pub measurement: Measurement,
}

/// Outcome of a bulk request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub indexed: usize,
    pub failed: usize,
    /// Reason of the first rejected item, if any
    pub first_error: Option<String>,
}

impl BulkSummary {
    /// Fold another chunk's outcome into this one.
    pub fn merge(&mut self, other: BulkSummary) {
        self.indexed += other.indexed;
        self.failed += other.failed;
        if self.first_error.is_none() {
            self.first_error = other.first_error;
        }
    }
}

/// Operations the services need from the search engine.
///
/// Implementations must not retry on their own: a retried write could be
/// applied twice. Connectivity failures and timeouts surface as
/// `ClimateError::UpstreamUnavailable`.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Run `request` against `indexes`, skipping partitions that do not exist.
    async fn search(
        &self,
        indexes: &IndexSet,
        request: &SearchRequest,
        routing: Option<&str>,
    ) -> ClimateResult<SearchResponse>;

    /// Store a measurement in `index`, routed by its city.
    ///
    /// With an `id` the document is replaced, otherwise the engine assigns
    /// one. Returns the document id.
    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        measurement: &Measurement,
    ) -> ClimateResult<String>;

    /// Store many measurements in one request.
    async fn bulk_index(&self, items: &[BulkItem]) -> ClimateResult<BulkSummary>;

    /// Create or replace an index template.
    async fn put_index_template(&self, name: &str, template: &Value) -> ClimateResult<()>;

    /// Check the engine answers at all.
    async fn ping(&self) -> ClimateResult<()>;
}
