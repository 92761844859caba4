//! Dashboard Routes
//!
//! - GET /api/v1/dashboard?region=&search= - Visible sensors grouped by region

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::aggregator::{dashboard, DashboardFilter, RegionGroup};
use crate::api::state::AppState;

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DashboardFilter>,
) -> Json<Vec<RegionGroup>> {
    let snapshot = state.aggregator.read().await.snapshot();
    let visibility = state.visibility.read().await;

    Json(dashboard(&snapshot, visibility.hidden(), &filter))
}
