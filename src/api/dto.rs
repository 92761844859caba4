//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::aggregator::{
    AggregateStore, HistoryPoint, SensorState, Stats, TemperatureBand,
};

// ============================================
// INGEST DTOs
// ============================================

/// Ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Status: "ok", or "unpersisted" when the write-back failed
    pub status: String,
    /// Number of readings applied
    pub accepted: usize,
    /// Updated state of every sensor in the batch
    pub sensors: AggregateStore,
}

// ============================================
// SENSOR DTOs
// ============================================

/// Query parameters for the sensor detail view
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    /// Number of recent history points (defaults to the configured value)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Return the full history window
    #[serde(default)]
    pub all: bool,
}

/// Sensor detail response
#[derive(Debug, Serialize)]
pub struct SensorDetailResponse {
    pub name: String,
    pub temp: f64,
    pub hum: f64,
    pub region: String,
    pub band: TemperatureBand,
    pub stats: Stats,
    /// Recent history, newest first
    pub recent: Vec<HistoryPoint>,
    /// Number of points in the full history window
    pub history_len: usize,
}

impl SensorDetailResponse {
    pub fn new(name: &str, state: &SensorState, recent: Vec<HistoryPoint>) -> Self {
        Self {
            name: name.to_string(),
            temp: state.temp,
            hum: state.hum,
            region: state.region.clone(),
            band: TemperatureBand::classify(state.temp),
            stats: Stats::from_history(&state.history),
            recent,
            history_len: state.history.len(),
        }
    }
}

// ============================================
// VISIBILITY DTOs
// ============================================

/// Hidden sensors response
#[derive(Debug, Serialize, Deserialize)]
pub struct HiddenResponse {
    /// Hidden names, sorted
    pub hidden: BTreeSet<String>,
    /// Whether the last operation changed the set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Storage status: "ok" or "error"
    pub storage: String,
    /// Number of sensors held by the aggregator
    pub sensors: usize,
    /// Number of hidden sensors
    pub hidden: usize,
    /// Open WebSocket connections
    pub ws_connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
