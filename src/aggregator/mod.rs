//! Sensor Reading Aggregator
//!
//! The core of Sensorboard: a keyed store that ingests inbound readings and
//! keeps, per sensor name, the latest values plus a rolling history window
//! of `HISTORY_CAPACITY` points, persisted after every mutation.
//!
//! - **types**: Readings, history points, sensor state
//! - **engine**: `SensorAggregator` (ingest, snapshot, clear) and persistence
//! - **stats**: Derived statistics over a history window
//! - **visibility**: Persisted hidden-sensor filter
//! - **view**: Dashboard read model (regions, cards, recent history)
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust
//! use sensorboard::aggregator::{SensorAggregator, SensorReading, Stats};
//! use sensorboard::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! let mut aggregator = SensorAggregator::load(Arc::new(MemoryStore::new()));
//! aggregator.ingest(SensorReading::new("greenhouse", 24.5, 61.0).region("Norte"));
//!
//! let snapshot = aggregator.snapshot();
//! let stats = Stats::from_history(&snapshot["greenhouse"].history);
//! assert_eq!(stats.avg_temp, 24.5);
//! ```

pub mod engine;
pub mod error;
pub mod stats;
pub mod types;
pub mod view;
pub mod visibility;

pub use engine::{
    load_sensors, parse_persisted_state, IngestSummary, SensorAggregator, SENSORS_KEY,
};
pub use error::{ParseError, ReadingError};
pub use stats::{round2, Stats};
pub use types::{
    get_or_default, AggregateStore, HistoryPoint, ReadingBatch, SensorReading, SensorState,
    DEFAULT_REGION, HISTORY_CAPACITY, MAX_NAME_LEN,
};
pub use view::{
    dashboard, recent_history, regions, DashboardFilter, RegionGroup, SensorCard,
    TemperatureBand,
};
pub use visibility::{parse_hidden_sensors, VisibilityFilter, HIDDEN_SENSORS_KEY};
