//! Query parameter parsing for the measurements listing.

use serde::{Deserialize, Serialize};

use climate_common::{ClimateError, ClimateResult, DateRange};

/// Bounds on the number of cities a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityLimits {
    /// Used when the request carries no `cities` parameter.
    #[serde(default = "default_cities")]
    pub default: usize,

    /// Largest accepted `cities` value (engine result window).
    #[serde(default = "default_max_cities")]
    pub max: usize,
}

impl Default for CityLimits {
    fn default() -> Self {
        Self {
            default: default_cities(),
            max: default_max_cities(),
        }
    }
}

fn default_cities() -> usize {
    10
}

fn default_max_cities() -> usize {
    10_000
}

impl CityLimits {
    /// Parse the raw `cities` value.
    ///
    /// Absent means the default. Anything that is not a positive integer
    /// within `max` fails with `InvalidLimit` carrying the raw value.
    pub fn parse(&self, raw: Option<&str>) -> ClimateResult<usize> {
        let Some(raw) = raw else {
            return Ok(self.default);
        };

        let invalid = || ClimateError::InvalidLimit(raw.to_string());
        let value: i64 = raw.trim().parse().map_err(|_| invalid())?;

        if value < 1 || value as u64 > self.max as u64 {
            return Err(invalid());
        }
        Ok(value as usize)
    }
}

/// Validated parameters of `GET /api/measurements`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementsQuery {
    /// Number of cities to return
    pub limit: usize,
    /// Range exactly as supplied by the caller
    pub range: DateRange,
}

impl MeasurementsQuery {
    /// Parse raw `cities`, `from` and `to` values.
    ///
    /// The limit is checked first, then the dates.
    pub fn parse(
        cities: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        limits: &CityLimits,
    ) -> ClimateResult<Self> {
        let limit = limits.parse(cities)?;
        let range = DateRange::parse(from, to)?;
        Ok(Self { limit, range })
    }
}
