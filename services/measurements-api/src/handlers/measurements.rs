//! Measurements listing handler.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    Json,
};
use serde::Deserialize;

use measurement_query::CitiesResponse;

use crate::error::ApiResult;
use crate::metrics::record_request;
use crate::state::AppState;

/// Raw listing parameters; parsing happens in the service so every
/// malformed value gets the list-form error body.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub cities: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/measurements - Hottest cities, optionally within a day range
pub async fn list_measurements_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<CitiesResponse>> {
    record_request("list");

    let Query(params) = params?;
    let cities = state
        .service
        .list(
            params.cities.as_deref(),
            params.from.as_deref(),
            params.to.as_deref(),
        )
        .await?;

    Ok(Json(CitiesResponse { cities }))
}
