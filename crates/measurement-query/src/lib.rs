//! Measurement query layer.
//!
//! Turns loosely-typed request parameters into bounded search requests
//! against the yearly measurement partitions, flattens search engine
//! responses into measurement records, and validates inbound records.
//!
//! Nothing in this crate performs I/O.

pub mod bodies;
pub mod index;
pub mod normalize;
pub mod queries;
pub mod response;
pub mod search;
pub mod validation;

pub use index::{IndexSelector, IndexSet, DEFAULT_SERIES_PREFIX};
pub use normalize::{normalize, StoredMeasurement};
pub use queries::{CityLimits, MeasurementsQuery};
pub use response::{Bucket, BucketAggregation, Hit, HitList, SearchResponse};
pub use bodies::{CitiesResponse, ErrorResponse};
pub use search::{Query, SearchRequest, SortOrder};
pub use validation::{validate_measurement, MeasurementPatch, UpdateKey};

/// Field names of the stored measurement document.
pub mod fields {
    pub const DAY: &str = "day";
    pub const AVERAGE_TEMPERATURE: &str = "average_temperature";
    pub const AVERAGE_TEMPERATURE_UNCERTAINTY: &str = "average_temperature_uncertainty";
    pub const CITY: &str = "city";
    pub const COUNTRY: &str = "country";
    pub const LOCATION: &str = "location";
    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";
}
