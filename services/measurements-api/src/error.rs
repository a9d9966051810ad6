//! HTTP rendering of measurement errors.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use climate_common::ClimateError;
use measurement_query::ErrorResponse;

use crate::metrics::record_error;

/// Handler error: a `ClimateError` rendered as `{"errors": [...]}`.
#[derive(Debug)]
pub struct ApiError(pub ClimateError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<ClimateError> for ApiError {
    fn from(err: ClimateError) -> Self {
        ApiError(err)
    }
}

/// Unparseable request bodies get the same list-form 400 as validation errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ClimateError::ValidationFailed(vec![rejection.body_text()]))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(ClimateError::ValidationFailed(vec![rejection.body_text()]))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.http_status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_upstream() || status.is_server_error() {
            error!(status = code, error = %self.0, "Request failed");
        } else {
            warn!(status = code, error = %self.0, "Request rejected");
        }
        record_error(code);

        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn render(err: ClimateError) -> (StatusCode, Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_failure_lists_every_message() {
        let (status, body) = render(ClimateError::ValidationFailed(vec![
            "Missing field city".to_string(),
            "Missing field day".to_string(),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"errors": ["Missing field city", "Missing field day"]}));
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_bad_request() {
        let (status, body) =
            render(ClimateError::UpstreamUnavailable("connection refused".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_and_engine_failures() {
        let (status, _) = render(ClimateError::NotFound {
            city: "Jerez".to_string(),
            day: "2021-08-01".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = render(ClimateError::SearchFailed("500".to_string())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
