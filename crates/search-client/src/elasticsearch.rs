//! Elasticsearch REST client.
//!
//! A thin reqwest wrapper: one HTTP call per operation, bounded by the
//! configured timeouts, never retried.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use climate_common::{ClimateError, ClimateResult, Measurement};
use measurement_query::{IndexSet, SearchRequest, SearchResponse};

use crate::config::SearchConfig;
use crate::engine::{BulkItem, BulkSummary, SearchEngine};

/// Longest engine error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Search engine client over the Elasticsearch REST API.
#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: Url,
    max_index_target_len: usize,
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemResult>>,
}

#[derive(Debug, Deserialize)]
struct BulkItemResult {
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

impl ElasticsearchClient {
    /// Create a client from config. No connection is made until first use.
    pub fn new(config: &SearchConfig) -> ClimateResult<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| {
            ClimateError::Internal(format!("Invalid search engine URL {}: {}", config.url, e))
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClimateError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            max_index_target_len: config.max_index_target_len,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> ClimateResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClimateError::Internal(format!("Invalid search engine URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Index list for the request path.
    ///
    /// Very long partition lists would exceed the engine's request line
    /// limit; the series wildcard is equivalent because every such search
    /// carries a `day` range filter.
    fn index_target(&self, indexes: &IndexSet) -> String {
        let target = indexes.target();
        if target.len() > self.max_index_target_len {
            debug!(
                partitions = indexes.names().map_or(0, |n| n.len()),
                "Index list too long, using series wildcard"
            );
            return indexes.pattern().to_string();
        }
        target
    }

    async fn send(&self, request: RequestBuilder) -> ClimateResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        warn!(status = %status, "Search engine rejected request");
        Err(ClimateError::SearchFailed(format!("{}: {}", status, body)))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ClimateResult<T> {
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn transport_error(err: reqwest::Error) -> ClimateError {
    if err.is_timeout() {
        ClimateError::UpstreamUnavailable(format!("request timed out: {}", err))
    } else {
        ClimateError::UpstreamUnavailable(err.to_string())
    }
}

fn bulk_body(items: &[BulkItem]) -> ClimateResult<String> {
    let mut body = String::new();
    for item in items {
        let action = serde_json::json!({
            "index": {"_index": item.index, "routing": item.measurement.city}
        });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&item.measurement)?);
        body.push('\n');
    }
    Ok(body)
}

#[async_trait]
impl SearchEngine for ElasticsearchClient {
    #[instrument(skip(self, request), fields(indexes = %indexes, size = request.size))]
    async fn search(
        &self,
        indexes: &IndexSet,
        request: &SearchRequest,
        routing: Option<&str>,
    ) -> ClimateResult<SearchResponse> {
        if indexes.is_empty() {
            return Ok(SearchResponse::default());
        }

        let target = self.index_target(indexes);
        let url = self.endpoint(&[&target, "_search"])?;

        let mut builder = self
            .client
            .post(url)
            .query(&[("ignore_unavailable", "true")])
            .json(request);
        if let Some(routing) = routing {
            builder = builder.query(&[("routing", routing)]);
        }

        let response = self.send(builder).await?;
        let parsed: SearchResponse = Self::read_json(response).await?;
        debug!(hits = parsed.hits.hits.len(), "Search completed");
        Ok(parsed)
    }

    #[instrument(skip(self, measurement), fields(city = %measurement.city, day = %measurement.day))]
    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        measurement: &Measurement,
    ) -> ClimateResult<String> {
        let builder = match id {
            Some(id) => self.client.put(self.endpoint(&[index, "_doc", id])?),
            None => self.client.post(self.endpoint(&[index, "_doc"])?),
        };
        let builder = builder
            .query(&[("routing", measurement.city.as_str())])
            .json(measurement);

        let response = self.send(builder).await?;
        let indexed: IndexResponse = Self::read_json(response).await?;
        debug!(id = %indexed.id, "Indexed measurement");
        Ok(indexed.id)
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn bulk_index(&self, items: &[BulkItem]) -> ClimateResult<BulkSummary> {
        if items.is_empty() {
            return Ok(BulkSummary::default());
        }

        let builder = self
            .client
            .post(self.endpoint(&["_bulk"])?)
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(bulk_body(items)?);

        let response = self.send(builder).await?;
        let bulk: BulkResponse = Self::read_json(response).await?;

        let mut summary = BulkSummary::default();
        for result in bulk.items.iter().flat_map(|item| item.values()) {
            if result.status < 300 {
                summary.indexed += 1;
            } else {
                summary.failed += 1;
                if summary.first_error.is_none() {
                    summary.first_error = result.error.as_ref().map(|e| e.to_string());
                }
            }
        }
        Ok(summary)
    }

    #[instrument(skip(self, template))]
    async fn put_index_template(&self, name: &str, template: &Value) -> ClimateResult<()> {
        let builder = self
            .client
            .put(self.endpoint(&["_index_template", name])?)
            .json(template);
        self.send(builder).await?;
        Ok(())
    }

    async fn ping(&self) -> ClimateResult<()> {
        let builder = self.client.get(self.base_url.clone());
        self.send(builder).await?;
        Ok(())
    }
}
