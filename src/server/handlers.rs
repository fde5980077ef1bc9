//! Request handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::AppState;
use crate::model::Location;

#[derive(Debug, Deserialize)]
pub struct IpParams {
    pub ip: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CityParams {
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: String,
    pub version: i32,
    pub records: usize,
}

/// GET /v1/ip/location?ip=
pub async fn location_by_ip(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IpParams>,
) -> Result<Json<Location>, ApiError> {
    let ip = non_empty(params.ip).ok_or_else(|| ApiError::bad_request("ip param is empty"))?;
    let location = state.provider.location_by_ip(&ip)?;
    Ok(Json(location.clone()))
}

/// GET /v1/city/locations?city=
pub async fn locations_by_city(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CityParams>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let city =
        non_empty(params.city).ok_or_else(|| ApiError::bad_request("city param is empty"))?;
    let locations = state.provider.locations_by_city(&city)?;
    Ok(Json(locations.into_iter().cloned().collect()))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: state.info.name.clone(),
        version: state.info.version,
        records: state.info.records,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
