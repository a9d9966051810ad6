//! Single measurement handlers: add and update.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use climate_common::Measurement;

use crate::error::ApiResult;
use crate::metrics::record_request;
use crate::state::AppState;

/// Key of the measurement to update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateParams {
    pub city: Option<String>,
    pub day: Option<String>,
}

/// POST /api/measurement/add - Store a new measurement
pub async fn add_measurement_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Measurement>)> {
    record_request("add");

    let Json(body) = payload?;
    let measurement = state.service.add(&body).await?;
    Ok((StatusCode::CREATED, Json(measurement)))
}

/// PATCH /api/measurement/update?city=&day= - Change the readings of a measurement
pub async fn update_measurement_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<UpdateParams>, QueryRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Measurement>> {
    record_request("update");

    let Query(params) = params?;
    let Json(body) = payload?;
    let measurement = state
        .service
        .update(params.city.as_deref(), params.day.as_deref(), &body)
        .await?;
    Ok(Json(measurement))
}
