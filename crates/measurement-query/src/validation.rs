//! Validation of inbound measurement records and updates.
//!
//! Inbound bodies are loosely typed JSON. All violations are collected so a
//! client can fix every problem from a single response.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use climate_common::{parse_day, ClimateError, ClimateResult, GeoPoint, Measurement};

use crate::fields;

/// Top-level fields every new measurement must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 6] = [
    fields::AVERAGE_TEMPERATURE,
    fields::AVERAGE_TEMPERATURE_UNCERTAINTY,
    fields::CITY,
    fields::COUNTRY,
    fields::DAY,
    fields::LOCATION,
];

/// Nested fields required inside `location`.
pub const LOCATION_FIELDS: [&str; 2] = [fields::LAT, fields::LON];

const NOT_AN_OBJECT: &str = "Request body must be a JSON object";

/// Coerce a loosely-typed value to an optional float.
///
/// Accepts JSON numbers and numeric strings; `null` means no reading.
/// Non-finite values are rejected since the engine cannot store them.
fn coerce_float(value: &Value) -> Result<Option<f64>, ()> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}

fn coerce_required_float(value: &Value) -> Result<f64, ()> {
    coerce_float(value)?.ok_or(())
}

/// Collects violations while coercing fields.
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn missing(&mut self, field: &str) {
        self.0.push(format!("Missing field {}", field));
    }

    fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    fn finish<T>(self, value: impl FnOnce() -> Option<T>) -> ClimateResult<T> {
        if !self.0.is_empty() {
            return Err(ClimateError::ValidationFailed(self.0));
        }
        value().ok_or_else(|| ClimateError::Internal("validated record incomplete".to_string()))
    }
}

/// Validate and coerce a new measurement.
///
/// Nested `location` fields are only checked when `location` itself is
/// present, so an absent parent yields a single violation.
pub fn validate_measurement(body: &Value) -> ClimateResult<Measurement> {
    let Some(body) = body.as_object() else {
        return Err(ClimateError::ValidationFailed(vec![NOT_AN_OBJECT.to_string()]));
    };

    let mut violations = Violations::default();
    let mut average_temperature = None;
    let mut average_temperature_uncertainty = None;
    let mut city = None;
    let mut country = None;
    let mut day = None;
    let mut location = None;

    for field in REQUIRED_FIELDS {
        let Some(value) = body.get(field) else {
            violations.missing(field);
            continue;
        };

        match field {
            fields::AVERAGE_TEMPERATURE | fields::AVERAGE_TEMPERATURE_UNCERTAINTY => {
                match coerce_float(value) {
                    Ok(v) if field == fields::AVERAGE_TEMPERATURE => average_temperature = Some(v),
                    Ok(v) => average_temperature_uncertainty = Some(v),
                    Err(()) => violations.push(format!("{} must be a float", field)),
                }
            }
            fields::CITY | fields::COUNTRY => match value.as_str() {
                Some(s) if field == fields::CITY => city = Some(s.to_string()),
                Some(s) => country = Some(s.to_string()),
                None => violations.push(format!("{} must be a string", field)),
            },
            fields::DAY => match value.as_str().and_then(parse_day) {
                Some(d) => day = Some(d),
                None => violations.push("Invalid date format for day"),
            },
            fields::LOCATION => location = validate_location(value, &mut violations),
            _ => {}
        }
    }

    violations.finish(|| {
        Some(Measurement {
            day: day?,
            average_temperature: average_temperature?,
            average_temperature_uncertainty: average_temperature_uncertainty?,
            city: city?,
            country: country?,
            location: location?,
        })
    })
}

fn validate_location(value: &Value, violations: &mut Violations) -> Option<GeoPoint> {
    let Some(location) = value.as_object() else {
        violations.push(format!("{} must be an object", fields::LOCATION));
        return None;
    };

    let mut coords = [None; 2];
    for (slot, field) in coords.iter_mut().zip(LOCATION_FIELDS) {
        let path = format!("{}.{}", fields::LOCATION, field);
        match location.get(field).map(coerce_required_float) {
            None => violations.missing(&path),
            Some(Err(())) => violations.push(format!("{} must be a float", path)),
            Some(Ok(v)) => *slot = Some(v),
        }
    }

    let [lat, lon] = coords;
    Some(GeoPoint::new(lat?, lon?))
}

/// Key of the measurement an update targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateKey {
    pub city: String,
    pub day: NaiveDate,
}

impl UpdateKey {
    /// Parse the `city` and `day` lookup parameters.
    pub fn parse(city: Option<&str>, day: Option<&str>) -> ClimateResult<Self> {
        let city = match city {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => return Err(ClimateError::MissingKey(fields::CITY.to_string())),
        };
        let raw_day = match day {
            Some(d) if !d.is_empty() => d,
            _ => return Err(ClimateError::MissingKey(fields::DAY.to_string())),
        };
        let day = parse_day(raw_day).ok_or_else(|| ClimateError::invalid_date(fields::DAY, raw_day))?;

        Ok(Self { city, day })
    }
}

/// Partial update of the temperature readings of a measurement.
///
/// The outer `Option` says whether the field was supplied, the inner one
/// carries the new value (`None` clears the reading).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementPatch {
    pub average_temperature: Option<Option<f64>>,
    pub average_temperature_uncertainty: Option<Option<f64>>,
}

impl MeasurementPatch {
    /// Parse an update body.
    ///
    /// Fields other than the two readings are ignored.
    pub fn parse(body: &Value) -> ClimateResult<Self> {
        let Some(body) = body.as_object() else {
            return Err(ClimateError::ValidationFailed(vec![NOT_AN_OBJECT.to_string()]));
        };

        let mut violations = Violations::default();
        let average_temperature =
            patch_field(body, fields::AVERAGE_TEMPERATURE, &mut violations);
        let average_temperature_uncertainty =
            patch_field(body, fields::AVERAGE_TEMPERATURE_UNCERTAINTY, &mut violations);

        let patch = violations.finish(|| {
            Some(Self {
                average_temperature,
                average_temperature_uncertainty,
            })
        })?;

        if patch.is_empty() {
            return Err(ClimateError::MissingUpdateField);
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.average_temperature.is_none() && self.average_temperature_uncertainty.is_none()
    }

    /// Apply the supplied fields, leaving the rest untouched.
    pub fn apply(&self, measurement: &mut Measurement) {
        if let Some(value) = self.average_temperature {
            measurement.average_temperature = value;
        }
        if let Some(value) = self.average_temperature_uncertainty {
            measurement.average_temperature_uncertainty = value;
        }
    }
}

fn patch_field(
    body: &Map<String, Value>,
    field: &str,
    violations: &mut Violations,
) -> Option<Option<f64>> {
    let value = body.get(field)?;
    match coerce_float(value) {
        Ok(v) => Some(v),
        Err(()) => {
            violations.push(format!("{} must be a float", field));
            None
        }
    }
}
