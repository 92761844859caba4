//! Sensor Reading Aggregator
//!
//! Keeps the latest value and a bounded rolling history per sensor name and
//! persists the whole mapping after every mutation:
//!
//! ```text
//! Ingest Path:
//!   ReadingBatch → for each reading: get_or_default → append → evict → store
//!                → serialize mapping → KeyValueStore["sensors"]
//!
//! Startup:
//!   KeyValueStore["sensors"] → parse_persisted_state → mapping (empty on error)
//! ```
//!
//! Mutation requires `&mut self`; callers that share the aggregator wrap it
//! in a `tokio::sync::RwLock`, so each ingest is applied and persisted as one
//! unit with respect to other ingests and readers.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::aggregator::error::ParseError;
use crate::aggregator::types::{get_or_default, AggregateStore, ReadingBatch, SensorState};
use crate::storage::KeyValueStore;

/// Persistence key of the aggregate mapping
pub const SENSORS_KEY: &str = "sensors";

/// Outcome of one ingest call
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct IngestSummary {
    /// Number of readings applied
    pub accepted: usize,
    /// State of every sensor touched by the batch, after the batch
    pub updated: AggregateStore,
    /// Whether the write-back to the store succeeded
    pub persisted: bool,
}

/// Process-wide keyed store of sensor states
pub struct SensorAggregator {
    sensors: AggregateStore,
    store: Arc<dyn KeyValueStore>,
}

impl SensorAggregator {
    /// Create an aggregator seeded from whatever `store` holds
    ///
    /// Missing or malformed persisted state starts the aggregator empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let sensors = load_sensors(store.as_ref());
        tracing::info!(sensors = sensors.len(), "Sensor aggregator loaded");
        Self { sensors, store }
    }

    /// Ingest a reading or a batch of readings stamped with the current time
    pub fn ingest(&mut self, batch: impl Into<ReadingBatch>) -> IngestSummary {
        self.ingest_at(batch, Utc::now().timestamp_millis())
    }

    /// Ingest a reading or a batch of readings stamped with `timestamp`
    ///
    /// Readings are applied in order. The full mapping is written back to the
    /// store exactly once per call, whatever the batch size.
    pub fn ingest_at(&mut self, batch: impl Into<ReadingBatch>, timestamp: i64) -> IngestSummary {
        let readings = batch.into().into_readings();
        let mut touched = BTreeSet::new();

        for reading in &readings {
            let mut state = get_or_default(&self.sensors, &reading.name, reading.region_hint());
            state.apply(reading, timestamp);
            self.sensors.insert(reading.name.clone(), state);
            touched.insert(reading.name.as_str());
        }

        let updated: AggregateStore = touched
            .into_iter()
            .filter_map(|name| {
                self.sensors
                    .get(name)
                    .map(|state| (name.to_string(), state.clone()))
            })
            .collect();

        tracing::debug!(
            readings = readings.len(),
            sensors = updated.len(),
            "Ingested readings"
        );

        let persisted = self.persist();

        IngestSummary {
            accepted: readings.len(),
            updated,
            persisted,
        }
    }

    /// Current mapping for read-only consumption
    ///
    /// When nothing is held in memory the persisted mapping is loaded
    /// instead, so a freshly started consumer still sees prior readings.
    pub fn snapshot(&self) -> AggregateStore {
        if self.sensors.is_empty() {
            load_sensors(self.store.as_ref())
        } else {
            self.sensors.clone()
        }
    }

    /// Reset to an empty mapping and persist it
    pub fn clear(&mut self) {
        let removed = self.sensors.len();
        self.sensors.clear();
        self.persist();
        tracing::info!(removed, "Cleared all sensors");
    }

    /// State of a single sensor
    pub fn sensor(&self, name: &str) -> Option<&SensorState> {
        self.sensors.get(name)
    }

    /// Number of sensors held in memory
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Write the full mapping back to the store
    ///
    /// Failures are logged and otherwise ignored; the in-memory state stays
    /// authoritative and the next successful write catches up.
    fn persist(&self) -> bool {
        let result = serde_json::to_string(&self.sensors)
            .map_err(crate::storage::StorageError::from)
            .and_then(|json| self.store.set(SENSORS_KEY, &json));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, key = SENSORS_KEY, "Failed to persist sensors");
                false
            }
        }
    }
}

/// Decode a persisted aggregate mapping
///
/// Histories longer than the window are trimmed to their newest points.
pub fn parse_persisted_state(raw: &str) -> Result<AggregateStore, ParseError> {
    let mut sensors: AggregateStore =
        serde_json::from_str(raw).map_err(|e| ParseError::Malformed {
            key: SENSORS_KEY,
            error: e.to_string(),
        })?;

    for state in sensors.values_mut() {
        state.enforce_capacity();
    }

    Ok(sensors)
}

/// Load the persisted mapping, treating any failure as "no prior state"
pub fn load_sensors(store: &dyn KeyValueStore) -> AggregateStore {
    let raw = match store.get(SENSORS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return AggregateStore::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read persisted sensors, starting empty");
            return AggregateStore::new();
        }
    };

    parse_persisted_state(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Discarding persisted sensors");
        AggregateStore::new()
    })
}
