//! Ingest Routes
//!
//! - POST /api/v1/ingest - A single reading or an array of readings

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::aggregator::ReadingBatch;
use crate::api::dto::IngestResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/ingest
///
/// Accepts the `sensor-data` payload: one reading object or an array of
/// them. The whole batch is rejected if any reading is invalid.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<ReadingBatch>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let summary = state.ingest(batch).await?;

    let status = if summary.persisted { "ok" } else { "unpersisted" };

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            status: status.to_string(),
            accepted: summary.accepted,
            sensors: summary.updated,
        }),
    ))
}
