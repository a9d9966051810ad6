//! Reader for the Berkeley Earth `GlobalLandTemperaturesByCity.csv` export.
//!
//! ```text
//! dt,AverageTemperature,AverageTemperatureUncertainty,City,Country,Latitude,Longitude
//! 1743-11-01,6.068,1.7369999999999999,Århus,Denmark,57.05N,10.33E
//! ```
//!
//! Coordinates carry a hemisphere suffix instead of a sign and months
//! without a reading have empty temperature columns.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use thiserror::Error;

use climate_common::{parse_day, GeoPoint, Measurement};

/// Why a CSV row could not become a measurement.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("malformed row: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid day {0:?}")]
    InvalidDay(String),

    #[error("invalid {axis} {value:?}")]
    InvalidCoordinate { axis: &'static str, value: String },
}

impl RowError {
    /// Errors after which the rest of the file cannot be read.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RowError::Csv(e) if e.is_io_error())
    }
}

/// One row as it appears in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CityRow {
    #[serde(rename = "dt")]
    pub day: String,
    #[serde(rename = "AverageTemperature")]
    pub average_temperature: Option<f64>,
    #[serde(rename = "AverageTemperatureUncertainty")]
    pub average_temperature_uncertainty: Option<f64>,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
}

impl CityRow {
    pub fn into_measurement(self) -> Result<Measurement, RowError> {
        let day = parse_day(&self.day).ok_or(RowError::InvalidDay(self.day))?;
        let lat = parse_coordinate(&self.latitude, 'N', 'S', "latitude")?;
        let lon = parse_coordinate(&self.longitude, 'E', 'W', "longitude")?;

        Ok(Measurement {
            day,
            average_temperature: self.average_temperature,
            average_temperature_uncertainty: self.average_temperature_uncertainty,
            city: self.city,
            country: self.country,
            location: GeoPoint::new(lat, lon),
        })
    }
}

/// Convert `57.05N` / `23.31S` style values to signed degrees.
pub fn parse_coordinate(
    raw: &str,
    positive: char,
    negative: char,
    axis: &'static str,
) -> Result<f64, RowError> {
    let invalid = || RowError::InvalidCoordinate {
        axis,
        value: raw.to_string(),
    };

    let raw = raw.trim();
    let (digits, sign) = if let Some(d) = raw.strip_suffix(positive) {
        (d, 1.0)
    } else if let Some(d) = raw.strip_suffix(negative) {
        (d, -1.0)
    } else {
        return Err(invalid());
    };

    let degrees: f64 = digits.parse().map_err(|_| invalid())?;
    if !degrees.is_finite() || degrees < 0.0 {
        return Err(invalid());
    }
    Ok(sign * degrees)
}

/// A measurement read from the file, or why its row was rejected.
#[derive(Debug)]
pub struct ParsedRow {
    /// 1-based line in the file
    pub line: u64,
    pub result: Result<Measurement, RowError>,
}

/// Iterator over the measurements of a CSV export.
pub struct CsvSource<R> {
    reader: csv::Reader<R>,
    headers: Option<StringRecord>,
    record: StringRecord,
    done: bool,
}

impl CsvSource<File> {
    pub fn open(path: &Path) -> Result<Self, RowError> {
        let reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        Ok(Self::new(reader))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(rdr: R) -> Self {
        Self::new(ReaderBuilder::new().has_headers(true).from_reader(rdr))
    }

    fn new(reader: csv::Reader<R>) -> Self {
        Self {
            reader,
            headers: None,
            record: StringRecord::new(),
            done: false,
        }
    }

    fn headers(&mut self) -> Result<StringRecord, RowError> {
        if let Some(headers) = &self.headers {
            return Ok(headers.clone());
        }
        let headers = self.reader.headers()?.clone();
        self.headers = Some(headers.clone());
        Ok(headers)
    }
}

impl<R: Read> Iterator for CsvSource<R> {
    type Item = ParsedRow;

    fn next(&mut self) -> Option<ParsedRow> {
        if self.done {
            return None;
        }

        let headers = match self.headers() {
            Ok(headers) => headers,
            Err(e) => {
                self.done = true;
                return Some(ParsedRow {
                    line: 1,
                    result: Err(e),
                });
            }
        };

        let line = self.reader.position().line();
        match self.reader.read_record(&mut self.record) {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) => {
                let line = self.record.position().map_or(line, |p| p.line());
                let result = self
                    .record
                    .deserialize::<CityRow>(Some(&headers))
                    .map_err(RowError::from)
                    .and_then(CityRow::into_measurement);
                Some(ParsedRow { line, result })
            }
            Err(e) => {
                let err = RowError::from(e);
                self.done = err.is_fatal();
                Some(ParsedRow {
                    line,
                    result: Err(err),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use test_utils::{assert_approx_eq, fixtures};

    const HEADER: &str =
        "dt,AverageTemperature,AverageTemperatureUncertainty,City,Country,Latitude,Longitude\n";

    fn rows(body: &str) -> Vec<ParsedRow> {
        CsvSource::from_reader(format!("{}{}", HEADER, body).as_bytes()).collect()
    }

    #[test]
    fn test_hemisphere_suffixes() {
        assert_approx_eq!(parse_coordinate("57.05N", 'N', 'S', "latitude").unwrap(), 57.05, 1e-9);
        assert_approx_eq!(parse_coordinate("23.31S", 'N', 'S', "latitude").unwrap(), -23.31, 1e-9);
        assert_approx_eq!(parse_coordinate("10.33E", 'E', 'W', "longitude").unwrap(), 10.33, 1e-9);
        assert_approx_eq!(parse_coordinate("42.82W", 'E', 'W', "longitude").unwrap(), -42.82, 1e-9);
    }

    #[test]
    fn test_coordinate_without_hemisphere_is_rejected() {
        for raw in ["57.05", "57.05E", "N", "-57.05N", "abcN"] {
            assert!(
                parse_coordinate(raw, 'N', 'S', "latitude").is_err(),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_reads_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(fixtures::CITY_CSV.as_bytes()).unwrap();

        let parsed: Vec<Measurement> = CsvSource::open(file.path())
            .unwrap()
            .map(|row| row.result.unwrap())
            .collect();

        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0].city, "Århus");
        assert_eq!(parsed[0].day, NaiveDate::from_ymd_opt(1743, 11, 1).unwrap());
        assert_eq!(parsed[0].average_temperature, Some(6.068));
        assert_approx_eq!(parsed[3].location.lat, -23.31, 1e-9);
        assert_approx_eq!(parsed[3].location.lon, -42.82, 1e-9);
    }

    #[test]
    fn test_empty_temperature_is_missing_reading() {
        let parsed = rows("1744-04-01,,,Århus,Denmark,57.05N,10.33E\n");
        let measurement = parsed[0].result.as_ref().unwrap();
        assert_eq!(measurement.average_temperature, None);
        assert_eq!(measurement.average_temperature_uncertainty, None);
    }

    #[test]
    fn test_bad_rows_do_not_stop_the_file() {
        let parsed = rows(
            "1743-13-01,6.068,1.737,Århus,Denmark,57.05N,10.33E\n\
             1743-11-01,warm,1.737,Århus,Denmark,57.05N,10.33E\n\
             1743-11-01,6.068,1.737,Århus,Denmark\n\
             1743-11-01,6.068,1.737,Århus,Denmark,57.05X,10.33E\n\
             1743-12-01,6.068,1.737,Århus,Denmark,57.05N,10.33E\n",
        );

        assert_eq!(parsed.len(), 5);
        assert!(matches!(parsed[0].result, Err(RowError::InvalidDay(_))));
        assert!(matches!(parsed[1].result, Err(RowError::Csv(_))));
        assert!(matches!(parsed[2].result, Err(RowError::Csv(_))));
        assert!(matches!(
            parsed[3].result,
            Err(RowError::InvalidCoordinate { axis: "latitude", .. })
        ));
        assert!(parsed[4].result.is_ok());
        assert_eq!(parsed[0].line, 2);
        assert_eq!(parsed[4].line, 6);
    }

    #[test]
    fn test_missing_file() {
        let err = CsvSource::open(Path::new("/nonexistent/cities.csv")).err().unwrap();
        assert!(err.is_fatal());
    }
}
