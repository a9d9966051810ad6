//! Daily city temperature measurements.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Geographic point as stored by the search engine (`geo_point`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One city's recorded climate reading for one day.
///
/// `(city, day)` is the identity of a measurement; there is no other key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Day of the reading, stored as a midnight timestamp
    #[serde(with = "crate::time::day_format")]
    pub day: NaiveDate,
    /// Average temperature in degrees Celsius
    pub average_temperature: Option<f64>,
    /// 95% confidence interval around the average
    pub average_temperature_uncertainty: Option<f64>,
    /// Short city identifier, also the routing and dedup key
    pub city: String,
    pub country: String,
    pub location: GeoPoint,
}

impl Measurement {
    /// Calendar year the measurement is partitioned by.
    pub fn year(&self) -> i32 {
        self.day.year()
    }
}
