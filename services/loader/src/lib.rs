//! Bulk loader for the city temperature series.
//!
//! Reads the Berkeley Earth CSV export and indexes every row into the
//! yearly partition of its day.

pub mod csv_source;
pub mod load;

pub use csv_source::{CsvSource, ParsedRow, RowError};
pub use load::{LoadPipeline, LoadReport, DEFAULT_CHUNK_SIZE};
