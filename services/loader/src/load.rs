//! Chunked bulk loading of CSV measurements into yearly partitions.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use climate_common::{ClimateError, ClimateResult};
use measurement_query::IndexSelector;
use search_client::template::measurement_template;
use search_client::{BulkItem, BulkSummary, SearchEngine};

use crate::csv_source::ParsedRow;

/// Rows per bulk request unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Outcome of a complete load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Rows converted and sent to the engine
    pub rows: usize,
    /// Rows that could not be converted
    pub skipped: usize,
    /// Bulk requests sent
    pub chunks: usize,
    /// Engine-side outcome, summed over chunks
    pub engine: BulkSummary,
}

/// Sends measurements to the engine in fixed-size bulk requests.
pub struct LoadPipeline {
    engine: Arc<dyn SearchEngine>,
    selector: IndexSelector,
    chunk_size: usize,
}

impl LoadPipeline {
    pub fn new(engine: Arc<dyn SearchEngine>, selector: IndexSelector, chunk_size: usize) -> Self {
        Self {
            engine,
            selector,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Create or replace the template every yearly partition is created from.
    pub async fn install_template(&self) -> ClimateResult<()> {
        let prefix = self.selector.prefix();
        self.engine
            .put_index_template(prefix, &measurement_template(prefix))
            .await?;
        info!(template = %prefix, pattern = %self.selector.wildcard(), "Installed index template");
        Ok(())
    }

    /// Load every row of `rows`, skipping the ones that cannot be converted.
    ///
    /// Chunks are sent one after another. An engine error aborts the load;
    /// documents the engine rejects individually are only counted.
    pub async fn run(&self, rows: impl IntoIterator<Item = ParsedRow>) -> ClimateResult<LoadReport> {
        let start = Instant::now();
        let mut report = LoadReport::default();
        let mut chunk = Vec::with_capacity(self.chunk_size);

        for row in rows {
            match row.result {
                Ok(measurement) => {
                    chunk.push(BulkItem {
                        index: self.selector.partition_for(measurement.day),
                        measurement,
                    });
                    report.rows += 1;
                }
                Err(e) if e.is_fatal() => {
                    return Err(ClimateError::Internal(format!(
                        "Failed to read input at line {}: {}",
                        row.line, e
                    )));
                }
                Err(e) => {
                    warn!(line = row.line, error = %e, "Skipping row");
                    report.skipped += 1;
                }
            }

            if chunk.len() >= self.chunk_size {
                self.flush(&mut chunk, &mut report).await?;
            }
        }
        self.flush(&mut chunk, &mut report).await?;

        info!(
            rows = report.rows,
            skipped = report.skipped,
            indexed = report.engine.indexed,
            failed = report.engine.failed,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Load completed"
        );
        Ok(report)
    }

    async fn flush(&self, chunk: &mut Vec<BulkItem>, report: &mut LoadReport) -> ClimateResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }

        let summary = self.engine.bulk_index(chunk).await?;
        if summary.failed > 0 {
            warn!(
                failed = summary.failed,
                first_error = summary.first_error.as_deref().unwrap_or(""),
                "Engine rejected documents"
            );
        }
        debug!(items = chunk.len(), indexed = summary.indexed, "Chunk sent");

        report.chunks += 1;
        report.engine.merge(summary);
        chunk.clear();

        info!("Inserted {} documents", report.engine.indexed);
        Ok(())
    }
}
