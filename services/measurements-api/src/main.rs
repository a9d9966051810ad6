//! Measurements API Server
//!
//! HTTP API over the global land temperatures by city series.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use measurements_api::build_router;
use measurements_api::config::ApiConfig;
use measurements_api::state::AppState;

/// Measurements API Server
#[derive(Parser, Debug)]
#[command(name = "measurements-api")]
#[command(about = "HTTP API over city temperature measurements")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:5000", env = "MEASUREMENTS_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Optional YAML configuration file overriding the environment
    #[arg(short, long, env = "MEASUREMENTS_CONFIG")]
    config: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long, env = "MEASUREMENTS_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting measurements API server");

    // Initialize application state
    let config = ApiConfig::load(args.config.as_deref())?;
    info!(
        url = %config.search.url,
        index_prefix = %config.search.index_prefix,
        "Using search engine"
    );
    let state = Arc::new(AppState::new(config)?.with_prometheus(prometheus_handle));

    let app = build_router(state);

    // Parse listen address
    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Measurements API listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
