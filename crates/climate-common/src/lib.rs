//! Common types and utilities shared across the climate measurement services.

pub mod error;
pub mod measurement;
pub mod time;

pub use error::{ClimateError, ClimateResult};
pub use measurement::{GeoPoint, Measurement};
pub use time::{parse_day, DateRange, DAY_FORMAT};
