//! Search engine access for the climate measurement services.
//!
//! Provides:
//! - the [`SearchEngine`] trait every component talks to
//! - an Elasticsearch REST implementation over reqwest
//! - the index template for the yearly measurement partitions

pub mod config;
pub mod elasticsearch;
pub mod engine;
pub mod template;

pub use config::SearchConfig;
pub use elasticsearch::ElasticsearchClient;
pub use engine::{BulkItem, BulkSummary, SearchEngine};
