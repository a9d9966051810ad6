//! Common test fixtures for the measurement services.
//!
//! Readings are taken from the Berkeley Earth city series, the data the
//! loader ingests, so values and coordinates look like production data.

use chrono::NaiveDate;
use serde_json::{json, Value};

use climate_common::{GeoPoint, Measurement};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("fixture dates are valid")
}

fn measurement(
    day: NaiveDate,
    temperature: f64,
    uncertainty: f64,
    city: &str,
    country: &str,
    location: (f64, f64),
) -> Measurement {
    Measurement {
        day,
        average_temperature: Some(temperature),
        average_temperature_uncertainty: Some(uncertainty),
        city: city.to_string(),
        country: country.to_string(),
        location: GeoPoint::new(location.0, location.1),
    }
}

/// A reading that is not part of the stored series.
pub fn jerez() -> Measurement {
    measurement(day(2021, 8, 1), 41.0, 0.37, "Jerez", "Spain", (31.35, 49.01))
}

/// The request body that adds [`jerez`].
pub fn jerez_body() -> Value {
    json!({
        "average_temperature": 41,
        "average_temperature_uncertainty": 0.37,
        "city": "Jerez",
        "country": "Spain",
        "day": "2021-08-01",
        "location": {"lat": 31.35, "lon": 49.01}
    })
}

/// The five hottest cities of the series, hottest first.
pub fn hot_cities() -> Vec<Measurement> {
    vec![
        measurement(day(2013, 7, 1), 39.156, 0.37, "Ahvaz", "Iran", (31.35, 49.01)),
        measurement(
            day(2013, 7, 1),
            39.156,
            0.37,
            "Masjed E Soleyman",
            "Iran",
            (31.35, 49.01),
        ),
        measurement(day(2012, 7, 1), 38.531, 0.431, "Abadan", "Iran", (29.74, 48.0)),
        measurement(
            day(2012, 7, 1),
            38.531,
            0.431,
            "Khorramshahr",
            "Iran",
            (29.74, 48.0),
        ),
        measurement(
            day(2012, 7, 1),
            38.049,
            0.658,
            "Buraydah",
            "Saudi Arabia",
            (26.52, 44.78),
        ),
    ]
}

/// Several readings of one city across partitions, hottest in 2013.
pub fn ahvaz_history() -> Vec<Measurement> {
    vec![
        measurement(day(1995, 7, 1), 37.8, 0.29, "Ahvaz", "Iran", (31.35, 49.01)),
        measurement(day(2013, 7, 1), 39.156, 0.37, "Ahvaz", "Iran", (31.35, 49.01)),
        measurement(day(2013, 1, 1), 12.4, 0.41, "Ahvaz", "Iran", (31.35, 49.01)),
        measurement(day(2012, 7, 1), 38.2, 0.44, "Ahvaz", "Iran", (31.35, 49.01)),
    ]
}

/// Collapsed listing response as returned by the engine for [`hot_cities`].
pub fn top_cities_response() -> Value {
    let hits: Vec<Value> = [
        ("global_land_temperatures_by_city-2013", "pIDEOn4B5Sa-aY70zJZF"),
        ("global_land_temperatures_by_city-2013", "zsbgOn4B5Sa-aY70b05w"),
        ("global_land_temperatures_by_city-2012", "j3_EOn4B5Sa-aY70Azsc"),
        ("global_land_temperatures_by_city-2012", "WLjbOn4B5Sa-aY70HLsL"),
        ("global_land_temperatures_by_city-2012", "qJHLOn4B5Sa-aY70rEXI"),
    ]
    .iter()
    .zip(hot_cities())
    .map(|((index, id), m)| {
        json!({
            "_index": index,
            "_type": "_doc",
            "_id": id,
            "_score": null,
            "_source": m,
            "fields": {"city": [m.city]},
            "sort": [m.average_temperature]
        })
    })
    .collect();

    json!({
        "took": 26,
        "timed_out": false,
        "_shards": {"total": 14, "successful": 14, "skipped": 10, "failed": 0},
        "hits": {
            "total": {"value": 10000, "relation": "gte"},
            "max_score": null,
            "hits": hits
        }
    })
}

/// Aggregation-shaped listing response, one bucket per city.
pub fn city_buckets_response(cities: &[Measurement]) -> Value {
    let buckets: Vec<Value> = cities
        .iter()
        .map(|m| {
            json!({
                "key": m.city,
                "doc_count": 1200,
                "by_top_hit": {"hits": {"hits": [{"_source": m}]}}
            })
        })
        .collect();

    json!({
        "hits": {"hits": []},
        "aggregations": {"cities": {"buckets": buckets}}
    })
}

/// Rows of the Berkeley Earth CSV, header included.
pub const CITY_CSV: &str = "\
dt,AverageTemperature,AverageTemperatureUncertainty,City,Country,Latitude,Longitude
1743-11-01,6.068,1.7369999999999999,Århus,Denmark,57.05N,10.33E
1744-04-01,,,Århus,Denmark,57.05N,10.33E
2013-07-01,39.156,0.37,Ahvaz,Iran,31.35N,49.01E
2012-07-01,26.95,0.3,Rio De Janeiro,Brazil,23.31S,42.82W
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_sources_match_measurements() {
        let response = top_cities_response();
        let hits = response["hits"]["hits"].as_array().unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0]["_source"]["day"], "2013-07-01T00:00:00");
        assert_eq!(hits[4]["_source"]["country"], "Saudi Arabia");
    }

    #[test]
    fn test_jerez_body_describes_jerez() {
        let body = jerez_body();
        assert_eq!(body["city"], jerez().city.as_str());
        assert_eq!(body["day"], "2021-08-01");
    }
}
