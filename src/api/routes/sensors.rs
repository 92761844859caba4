//! Sensor Routes
//!
//! - GET /api/v1/sensors - Snapshot of all sensors
//! - DELETE /api/v1/sensors - Clear all sensors
//! - GET /api/v1/sensors/:name - Sensor detail
//! - GET /api/v1/sensors/:name/stats - Sensor statistics
//! - GET /api/v1/regions - Distinct regions

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::aggregator::{recent_history, regions, AggregateStore, SensorState, Stats};
use crate::api::dto::{DetailQuery, SensorDetailResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /api/v1/sensors
pub async fn list_sensors(State(state): State<Arc<AppState>>) -> Json<AggregateStore> {
    Json(state.aggregator.read().await.snapshot())
}

/// DELETE /api/v1/sensors
///
/// Full reset; there is no partial clear.
pub async fn clear_sensors(State(state): State<Arc<AppState>>) -> StatusCode {
    state.clear().await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/sensors/:name
pub async fn get_sensor(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<DetailQuery>,
) -> ApiResult<Json<SensorDetailResponse>> {
    let sensor = find_sensor(&state, &name).await?;

    let limit = if query.all {
        None
    } else {
        Some(query.limit.unwrap_or(state.config.recent_history))
    };
    let recent = recent_history(&sensor, limit);

    Ok(Json(SensorDetailResponse::new(&name, &sensor, recent)))
}

/// GET /api/v1/sensors/:name/stats
pub async fn get_sensor_stats(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Stats>> {
    let sensor = find_sensor(&state, &name).await?;
    Ok(Json(Stats::from_history(&sensor.history)))
}

/// GET /api/v1/regions
pub async fn list_regions(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let snapshot = state.aggregator.read().await.snapshot();
    Json(regions(&snapshot))
}

async fn find_sensor(state: &AppState, name: &str) -> ApiResult<SensorState> {
    let aggregator = state.aggregator.read().await;
    aggregator
        .sensor(name)
        .cloned()
        .or_else(|| aggregator.snapshot().remove(name))
        .ok_or_else(|| ApiError::NotFound(format!("Sensor '{}'", name)))
}
