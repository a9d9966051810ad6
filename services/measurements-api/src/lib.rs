//! Measurements API Service Library
//!
//! This crate provides the HTTP server for listing, adding and updating
//! city temperature measurements stored in yearly search engine partitions.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod service;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router around shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Liveness
        .route("/", get(handlers::landing::landing_handler))
        // Measurements
        .route(
            "/api/measurements",
            get(handlers::measurements::list_measurements_handler),
        )
        .route(
            "/api/measurement/add",
            post(handlers::measurement::add_measurement_handler),
        )
        .route(
            "/api/measurement/update",
            patch(handlers::measurement::update_measurement_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
