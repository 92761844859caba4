//! Visibility Routes
//!
//! - GET /api/v1/hidden - Hidden sensor names
//! - POST /api/v1/hidden/:name - Hide a sensor
//! - DELETE /api/v1/hidden/:name - Show a sensor again
//!
//! Hiding only affects listings; sensor data is never deleted here.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::HiddenResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::{blocking_io, AppState};

/// GET /api/v1/hidden
pub async fn list_hidden(State(state): State<Arc<AppState>>) -> Json<HiddenResponse> {
    let visibility = state.visibility.read().await;
    Json(HiddenResponse {
        hidden: visibility.hidden().clone(),
        changed: None,
    })
}

/// POST /api/v1/hidden/:name
pub async fn hide_sensor(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<HiddenResponse>> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Sensor name cannot be empty".to_string(),
        ));
    }

    let mut visibility = state.visibility.write().await;
    let changed = blocking_io(|| visibility.evict(&name));

    Ok(Json(HiddenResponse {
        hidden: visibility.hidden().clone(),
        changed: Some(changed),
    }))
}

/// DELETE /api/v1/hidden/:name
pub async fn show_sensor(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<HiddenResponse> {
    let mut visibility = state.visibility.write().await;
    let changed = blocking_io(|| visibility.restore(&name));

    Json(HiddenResponse {
        hidden: visibility.hidden().clone(),
        changed: Some(changed),
    })
}
