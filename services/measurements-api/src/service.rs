//! Measurement operations behind the HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use climate_common::{ClimateError, ClimateResult, Measurement, DAY_FORMAT};
use measurement_query::normalize::stored_hits;
use measurement_query::{
    normalize, validate_measurement, CityLimits, IndexSelector, IndexSet, MeasurementPatch,
    MeasurementsQuery, SearchRequest, SearchResponse, UpdateKey,
};
use search_client::SearchEngine;

use crate::metrics::record_search;

/// Listing, adding and updating measurements of one series.
pub struct MeasurementService {
    engine: Arc<dyn SearchEngine>,
    selector: IndexSelector,
    limits: CityLimits,
}

impl MeasurementService {
    pub fn new(engine: Arc<dyn SearchEngine>, selector: IndexSelector, limits: CityLimits) -> Self {
        Self {
            engine,
            selector,
            limits,
        }
    }

    pub fn selector(&self) -> &IndexSelector {
        &self.selector
    }

    /// Hottest cities within the optional range, one record per city.
    pub async fn list(
        &self,
        cities: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> ClimateResult<Vec<Measurement>> {
        self.list_as_of(cities, from, to, Utc::now().date_naive()).await
    }

    /// [`Self::list`] with an explicit current day for open-ended ranges.
    #[instrument(skip(self))]
    pub async fn list_as_of(
        &self,
        cities: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
    ) -> ClimateResult<Vec<Measurement>> {
        let query = MeasurementsQuery::parse(cities, from, to, &self.limits)?;
        let indexes = self.selector.select(&query.range, today);
        if indexes.is_empty() {
            debug!("No partition can hold the requested range");
            return Ok(Vec::new());
        }

        let request = SearchRequest::top_cities(query.limit, &query.range);
        let response = self.search(&indexes, &request, None).await?;
        let records = normalize(response)?;

        debug!(cities = records.len(), indexes = %indexes, "Listed measurements");
        Ok(records)
    }

    /// Validate and store a new measurement in its yearly partition.
    pub async fn add(&self, body: &Value) -> ClimateResult<Measurement> {
        let measurement = validate_measurement(body)?;
        let index = self.selector.partition_for(measurement.day);

        let id = self
            .engine
            .index_document(&index, None, &measurement)
            .await?;

        info!(
            city = %measurement.city,
            day = %measurement.day,
            index = %index,
            id = %id,
            "Added measurement"
        );
        Ok(measurement)
    }

    /// Change the readings of the measurement identified by `city` and `day`.
    ///
    /// The stored document is replaced under its id, so the engine keeps a
    /// single measurement per key.
    pub async fn update(
        &self,
        city: Option<&str>,
        day: Option<&str>,
        body: &Value,
    ) -> ClimateResult<Measurement> {
        let key = UpdateKey::parse(city, day)?;
        let patch = MeasurementPatch::parse(body)?;

        let indexes = self.selector.partition_set(key.day);
        let request = SearchRequest::by_key(&key.city, key.day);
        let response = self.search(&indexes, &request, Some(&key.city)).await?;

        let mut matches = stored_hits(&response)?;
        if matches.len() > 1 {
            warn!(
                city = %key.city,
                day = %key.day,
                "Several measurements share a key, updating the first"
            );
        }
        if matches.is_empty() {
            return Err(ClimateError::NotFound {
                city: key.city,
                day: key.day.format(DAY_FORMAT).to_string(),
            });
        }
        let mut stored = matches.swap_remove(0);

        patch.apply(&mut stored.measurement);
        self.engine
            .index_document(&stored.index, Some(&stored.id), &stored.measurement)
            .await?;

        info!(city = %key.city, day = %key.day, id = %stored.id, "Updated measurement");
        Ok(stored.measurement)
    }

    async fn search(
        &self,
        indexes: &IndexSet,
        request: &SearchRequest,
        routing: Option<&str>,
    ) -> ClimateResult<SearchResponse> {
        let start = Instant::now();
        let result = self.engine.search(indexes, request, routing).await;
        record_search(start.elapsed());
        result
    }
}
