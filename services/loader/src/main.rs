//! City temperature loader.
//!
//! Installs the partition index template, then bulk indexes the CSV export
//! in fixed-size chunks.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use loader::{CsvSource, LoadPipeline, DEFAULT_CHUNK_SIZE};
use measurement_query::IndexSelector;
use search_client::{ElasticsearchClient, SearchConfig};

#[derive(Parser, Debug)]
#[command(name = "loader")]
#[command(about = "Bulk load GlobalLandTemperaturesByCity.csv into the search engine")]
struct Args {
    /// CSV file to load
    #[arg(short, long, default_value = "data/GlobalLandTemperaturesByCity.csv")]
    file: PathBuf,

    /// Rows per bulk request
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, env = "LOADER_CHUNK_SIZE")]
    chunk_size: usize,

    /// Search engine URL (overrides ES_URL)
    #[arg(long)]
    url: Option<String>,

    /// Do not install the index template before loading
    #[arg(long)]
    skip_template: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    if args.chunk_size == 0 {
        anyhow::bail!("--chunk-size must be at least 1");
    }

    let mut config = SearchConfig::from_env();
    if let Some(url) = args.url {
        config.url = url;
    }
    info!(
        file = %args.file.display(),
        url = %config.url,
        index_prefix = %config.index_prefix,
        chunk_size = args.chunk_size,
        "Starting city temperature load"
    );

    let engine = Arc::new(ElasticsearchClient::new(&config)?);
    let pipeline = LoadPipeline::new(
        engine,
        IndexSelector::new(config.index_prefix.clone()),
        args.chunk_size,
    );

    if !args.skip_template {
        pipeline
            .install_template()
            .await
            .context("Failed to install index template")?;
    }

    let source = CsvSource::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let report = pipeline.run(source).await.context("Load aborted")?;

    if report.engine.failed > 0 {
        warn!(
            failed = report.engine.failed,
            first_error = report.engine.first_error.as_deref().unwrap_or(""),
            "Some documents were rejected by the search engine"
        );
    }
    info!(
        rows = report.rows,
        skipped = report.skipped,
        chunks = report.chunks,
        indexed = report.engine.indexed,
        "Done"
    );

    Ok(())
}
