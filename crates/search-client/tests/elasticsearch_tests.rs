//! Tests for the Elasticsearch client against a stub HTTP engine.
//!
//! The stub records every request it receives and answers with canned
//! bodies, so these run without a real search engine.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Extension, Path, Query},
    http::{Method, StatusCode},
    routing::{any, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

use climate_common::{ClimateError, DateRange, GeoPoint, Measurement};
use measurement_query::{IndexSelector, SearchRequest};
use search_client::{BulkItem, ElasticsearchClient, SearchConfig, SearchEngine};

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

async fn record(
    log: &Log,
    method: Method,
    path: String,
    params: HashMap<String, String>,
    body: Value,
) {
    log.lock().unwrap().push(Recorded {
        method,
        path,
        params,
        body,
    });
}

async fn search_handler(
    Extension(log): Extension<Log>,
    Path(target): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&log, Method::POST, format!("/{}/_search", target), params, body).await;
    if target.starts_with("broken-") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "search_phase_execution_exception"})),
        );
    }
    (StatusCode::OK, Json(json!({
        "took": 3,
        "hits": {"hits": [{
            "_index": "global_land_temperatures_by_city-2013",
            "_id": "pIDEOn4B5Sa-aY70zJZF",
            "_source": {
                "day": "2013-07-01T00:00:00",
                "average_temperature": 39.156,
                "average_temperature_uncertainty": 0.37,
                "city": "Ahvaz",
                "country": "Iran",
                "location": {"lat": 31.35, "lon": 49.01}
            }
        }]}
    })))
}

async fn doc_handler(
    Extension(log): Extension<Log>,
    method: Method,
    Path(params_path): Path<HashMap<String, String>>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let index = params_path.get("index").cloned().unwrap_or_default();
    let id = params_path
        .get("id")
        .cloned()
        .unwrap_or_else(|| "generated-id".to_string());
    record(&log, method, format!("/{}/_doc/{}", index, id), params, body).await;
    (StatusCode::CREATED, Json(json!({"_index": index, "_id": id, "result": "created"})))
}

async fn bulk_handler(Extension(log): Extension<Log>, body: String) -> Json<Value> {
    let lines: Vec<Value> = body
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    record(&log, Method::POST, "/_bulk".to_string(), HashMap::new(), json!(lines)).await;
    Json(json!({
        "errors": true,
        "items": [
            {"index": {"status": 201}},
            {"index": {"status": 400, "error": {"type": "mapper_parsing_exception"}}}
        ]
    }))
}

async fn start_stub() -> (SocketAddr, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/:index/_search", post(search_handler))
        .route("/_bulk", post(bulk_handler))
        .route("/:index/_doc", post(doc_handler))
        .route("/:index/_doc/:id", any(doc_handler))
        .layer(Extension(log.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, log)
}

fn client_for(addr: SocketAddr) -> ElasticsearchClient {
    ElasticsearchClient::new(&SearchConfig {
        url: format!("http://{}", addr),
        timeout_secs: 5,
        ..SearchConfig::default()
    })
    .unwrap()
}

fn jerez() -> Measurement {
    Measurement {
        day: NaiveDate::from_ymd_opt(2021, 8, 1).unwrap(),
        average_temperature: Some(41.0),
        average_temperature_uncertainty: Some(0.37),
        city: "Jerez".to_string(),
        country: "Spain".to_string(),
        location: GeoPoint::new(31.35, 49.01),
    }
}

// ============================================================================
// search
// ============================================================================

#[tokio::test]
async fn test_search_targets_partitions_and_ignores_unavailable() {
    let (addr, log) = start_stub().await;
    let es = client_for(addr);

    let range = DateRange::parse(Some("2018-01-01"), Some("2019-04-07")).unwrap();
    let indexes = IndexSelector::new("prefix").select(&range, NaiveDate::MIN);
    let request = SearchRequest::top_cities(5, &range);

    let response = es.search(&indexes, &request, None).await.unwrap();
    assert_eq!(response.hits.hits.len(), 1);

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/prefix-2018,prefix-2019/_search");
    assert_eq!(calls[0].params.get("ignore_unavailable").map(String::as_str), Some("true"));
    assert!(calls[0].params.get("routing").is_none());
    assert_eq!(calls[0].body, serde_json::to_value(&request).unwrap());
}

#[tokio::test]
async fn test_search_passes_routing() {
    let (addr, log) = start_stub().await;
    let es = client_for(addr);

    let day = NaiveDate::from_ymd_opt(2021, 8, 1).unwrap();
    let indexes = IndexSelector::new("prefix").partition_set(day);
    es.search(&indexes, &SearchRequest::by_key("Jerez", day), Some("Jerez"))
        .await
        .unwrap();

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls[0].path, "/prefix-2021/_search");
    assert_eq!(calls[0].params.get("routing").map(String::as_str), Some("Jerez"));
}

#[tokio::test]
async fn test_engine_error_status_is_search_failed() {
    let (addr, _log) = start_stub().await;
    let es = client_for(addr);

    let indexes = IndexSelector::new("broken").select(&DateRange::open(), NaiveDate::MIN);
    let err = es
        .search(&indexes, &SearchRequest::top_cities(10, &DateRange::open()), None)
        .await
        .unwrap_err();

    match err {
        ClimateError::SearchFailed(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("search_phase_execution_exception"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_engine_is_upstream_unavailable() {
    // Grab a free port and close it again so nothing is listening there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let es = client_for(addr);
    let indexes = IndexSelector::new("prefix").select(&DateRange::open(), NaiveDate::MIN);
    let err = es
        .search(&indexes, &SearchRequest::top_cities(10, &DateRange::open()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ClimateError::UpstreamUnavailable(_)));
    assert_eq!(err.http_status_code(), 400);

    assert!(matches!(
        es.ping().await.unwrap_err(),
        ClimateError::UpstreamUnavailable(_)
    ));
}

// ============================================================================
// writes
// ============================================================================

#[tokio::test]
async fn test_index_new_document_is_routed_by_city() {
    let (addr, log) = start_stub().await;
    let es = client_for(addr);

    let id = es
        .index_document("prefix-2021", None, &jerez())
        .await
        .unwrap();
    assert_eq!(id, "generated-id");

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls[0].method, Method::POST);
    assert_eq!(calls[0].params.get("routing").map(String::as_str), Some("Jerez"));
    assert_eq!(calls[0].body["day"], "2021-08-01T00:00:00");
}

#[tokio::test]
async fn test_replace_document_uses_put() {
    let (addr, log) = start_stub().await;
    let es = client_for(addr);

    let id = es
        .index_document("prefix-2021", Some("abc"), &jerez())
        .await
        .unwrap();
    assert_eq!(id, "abc");

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls[0].method, Method::PUT);
    assert_eq!(calls[0].path, "/prefix-2021/_doc/abc");
}

#[tokio::test]
async fn test_bulk_counts_rejected_items() {
    let (addr, log) = start_stub().await;
    let es = client_for(addr);

    let items = vec![
        BulkItem {
            index: "prefix-2021".to_string(),
            measurement: jerez(),
        },
        BulkItem {
            index: "prefix-2021".to_string(),
            measurement: jerez(),
        },
    ];

    let summary = es.bulk_index(&items).await.unwrap();
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.first_error.unwrap().contains("mapper_parsing_exception"));

    let calls = log.lock().unwrap().clone();
    let lines = calls[0].body.as_array().unwrap();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["index"]["_index"], "prefix-2021");
}

#[tokio::test]
async fn test_empty_bulk_makes_no_request() {
    let (addr, log) = start_stub().await;
    let es = client_for(addr);

    let summary = es.bulk_index(&[]).await.unwrap();
    assert_eq!(summary.indexed, 0);
    assert!(log.lock().unwrap().is_empty());
}
