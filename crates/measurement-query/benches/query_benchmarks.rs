//! Benchmarks for the measurement query crate.
//!
//! Run with: cargo bench --package measurement-query

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serde_json::json;

use climate_common::DateRange;
use measurement_query::{
    normalize, validate_measurement, CityLimits, IndexSelector, MeasurementsQuery, SearchRequest,
    SearchResponse,
};

// =============================================================================
// REQUEST CONSTRUCTION
// =============================================================================

fn bench_request_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_construction");
    let selector = IndexSelector::default();
    let limits = CityLimits::default();
    let today = NaiveDate::from_ymd_opt(2022, 1, 20).unwrap();

    group.bench_function("parse_params", |b| {
        b.iter(|| {
            MeasurementsQuery::parse(
                black_box(Some("15")),
                black_box(Some("2018-01-01")),
                black_box(Some("2020-04-07")),
                &limits,
            )
        })
    });

    let bounded = DateRange::parse(Some("2018-01-01"), Some("2020-04-07")).unwrap();
    group.bench_function("select_three_years", |b| {
        b.iter(|| selector.select(black_box(&bounded), today).target())
    });

    // Worst case: open lower bound enumerates five centuries
    let open_start = DateRange::parse(None, Some("2018-01-01")).unwrap();
    group.bench_function("select_open_start", |b| {
        b.iter(|| selector.select(black_box(&open_start), today).target())
    });

    group.bench_function("serialize_body", |b| {
        b.iter(|| serde_json::to_vec(&SearchRequest::top_cities(10, black_box(&bounded))))
    });

    group.finish();
}

// =============================================================================
// RESPONSE NORMALIZATION
// =============================================================================

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");

    for size in [10usize, 100, 1000] {
        let hits: Vec<_> = (0..size)
            .map(|i| {
                json!({
                    "_index": "global_land_temperatures_by_city-2013",
                    "_id": format!("doc-{}", i),
                    "_source": {
                        "day": "2013-07-01T00:00:00",
                        "average_temperature": 39.0 - i as f64 * 0.01,
                        "average_temperature_uncertainty": 0.37,
                        "city": format!("City {}", i),
                        "country": "Iran",
                        "location": {"lat": 31.35, "lon": 49.01}
                    }
                })
            })
            .collect();
        let response: SearchResponse =
            serde_json::from_value(json!({"hits": {"hits": hits}})).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("hits_{}", size), |b| {
            b.iter(|| normalize(black_box(response.clone())))
        });
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let body = json!({
        "average_temperature": 41,
        "average_temperature_uncertainty": "0.37",
        "city": "Jerez",
        "country": "Spain",
        "day": "2021-08-01",
        "location": {"lat": 31.35, "lon": 49.01}
    });

    c.bench_function("validate_measurement", |b| {
        b.iter(|| validate_measurement(black_box(&body)))
    });
}

criterion_group!(benches, bench_request_construction, bench_normalization, bench_validation);
criterion_main!(benches);
