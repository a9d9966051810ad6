//! Request metrics, exported through the Prometheus recorder.
//!
//! Without an installed recorder (tests, library use) these are no-ops.

use std::time::Duration;

use metrics::{counter, histogram};

/// Record a request to one of the measurement endpoints.
pub fn record_request(endpoint: &'static str) {
    counter!("measurement_requests_total", "endpoint" => endpoint).increment(1);
}

/// Record an error response by status code.
pub fn record_error(status: u16) {
    counter!("measurement_errors_total", "status" => status.to_string()).increment(1);
}

/// Record the time spent waiting on one engine search.
pub fn record_search(elapsed: Duration) {
    histogram!("search_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
}
