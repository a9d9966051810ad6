//! Application state for the measurements API.

use std::sync::Arc;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;

use measurement_query::IndexSelector;
use search_client::{ElasticsearchClient, SearchEngine};

use crate::config::ApiConfig;
use crate::service::MeasurementService;

/// Shared application state.
pub struct AppState {
    /// Measurement operations over the configured engine.
    pub service: MeasurementService,

    /// Engine handle, also used by the readiness check.
    pub engine: Arc<dyn SearchEngine>,

    /// Configuration the state was built from.
    pub config: ApiConfig,

    /// Prometheus recorder handle, absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new AppState talking to the Elasticsearch cluster in `config`.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = ElasticsearchClient::new(&config.search)?;
        Ok(Self::with_engine(config, Arc::new(client)))
    }

    /// Create a new AppState around any engine implementation.
    pub fn with_engine(config: ApiConfig, engine: Arc<dyn SearchEngine>) -> Self {
        let selector = IndexSelector::new(config.search.index_prefix.clone());
        let service = MeasurementService::new(Arc::clone(&engine), selector, config.cities);

        Self {
            service,
            engine,
            config,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
