//! # Sensorboard
//!
//! Sensor reading aggregation service. Readings of temperature and humidity
//! arrive over HTTP or WebSocket; each sensor keeps its latest values, its
//! region and a rolling window of recent history, persisted as JSON.
//!
//! ## Modules
//!
//! - [`aggregator`]: Reading ingestion, rolling history, statistics and dashboard views
//! - [`storage`]: Key-value persistence (file-backed and in-memory)
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: Real-time `sensor-data` channel
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensorboard::aggregator::{SensorAggregator, SensorReading};
//! use sensorboard::storage::FileStore;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::open("./sensorboard_data")?);
//!     let mut aggregator = SensorAggregator::load(store);
//!
//!     aggregator.ingest(vec![
//!         SensorReading::new("greenhouse", 24.5, 61.0).region("Norte"),
//!         SensorReading::new("cellar", 14.0, 80.0),
//!     ]);
//!
//!     for (name, state) in aggregator.snapshot() {
//!         println!("{}: {} C, {} %", name, state.temp, state.hum);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod api;
pub mod config;
pub mod storage;
pub mod websocket;

// Re-export top-level types for convenience
pub use aggregator::{
    AggregateStore, HistoryPoint, IngestSummary, ReadingBatch, ReadingError, SensorAggregator,
    SensorReading, SensorState, Stats, VisibilityFilter,
};

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent,
};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};
