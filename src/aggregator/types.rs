//! Core data types for the sensor aggregator
//!
//! - `SensorReading`: one inbound temperature/humidity sample
//! - `ReadingBatch`: a single reading or an ordered array of readings
//! - `HistoryPoint`: one retained sample in a sensor's rolling window
//! - `SensorState`: latest values plus the bounded history for one sensor
//! - `AggregateStore`: sensor name to state mapping

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::aggregator::error::ReadingError;

/// Maximum number of history points retained per sensor
pub const HISTORY_CAPACITY: usize = 20;

/// Region assigned to sensors that never reported one
pub const DEFAULT_REGION: &str = "N/A";

/// Maximum accepted length of a sensor name, in bytes
pub const MAX_NAME_LEN: usize = 100;

/// Mapping from sensor name to its aggregated state
pub type AggregateStore = BTreeMap<String, SensorState>;

/// An inbound reading as delivered on the `sensor-data` channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    /// Sensor identity
    pub name: String,
    /// Temperature in degrees Celsius
    pub temp: f64,
    /// Relative humidity in percent
    pub hum: f64,
    /// Optional region the sensor belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl SensorReading {
    pub fn new(name: impl Into<String>, temp: f64, hum: f64) -> Self {
        Self {
            name: name.into(),
            temp,
            hum,
            region: None,
        }
    }

    /// Builder method: set region
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Region carried by this reading, treating blank strings as absent
    pub fn region_hint(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Check the reading against the channel contract
    pub fn validate(&self) -> Result<(), ReadingError> {
        if self.name.trim().is_empty() {
            return Err(ReadingError::EmptyName);
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(ReadingError::NameTooLong {
                max: MAX_NAME_LEN,
            });
        }
        if !self.temp.is_finite() {
            return Err(ReadingError::NonFiniteTemp {
                name: self.name.clone(),
            });
        }
        if !self.hum.is_finite() {
            return Err(ReadingError::NonFiniteHum {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Payload of one `sensor-data` event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ReadingBatch {
    /// Several readings delivered together, applied in order
    Many(Vec<SensorReading>),
    /// A single reading
    One(SensorReading),
}

impl ReadingBatch {
    /// Number of readings in the batch
    pub fn len(&self) -> usize {
        match self {
            ReadingBatch::Many(readings) => readings.len(),
            ReadingBatch::One(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every reading and the batch size
    pub fn validate(&self, max_batch_size: usize) -> Result<(), ReadingError> {
        if self.is_empty() {
            return Err(ReadingError::EmptyBatch);
        }
        if self.len() > max_batch_size {
            return Err(ReadingError::BatchTooLarge {
                size: self.len(),
                max: max_batch_size,
            });
        }
        match self {
            ReadingBatch::Many(readings) => readings.iter().try_for_each(SensorReading::validate),
            ReadingBatch::One(reading) => reading.validate(),
        }
    }

    /// Flatten into readings in arrival order
    pub fn into_readings(self) -> Vec<SensorReading> {
        match self {
            ReadingBatch::Many(readings) => readings,
            ReadingBatch::One(reading) => vec![reading],
        }
    }
}

impl From<SensorReading> for ReadingBatch {
    fn from(reading: SensorReading) -> Self {
        ReadingBatch::One(reading)
    }
}

impl From<Vec<SensorReading>> for ReadingBatch {
    fn from(readings: Vec<SensorReading>) -> Self {
        ReadingBatch::Many(readings)
    }
}

/// One retained sample in a sensor's rolling history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    pub temp: f64,
    pub hum: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

/// Aggregated state of a single sensor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorState {
    /// Latest temperature
    pub temp: f64,
    /// Latest humidity
    pub hum: f64,
    /// Region the sensor belongs to
    pub region: String,
    /// Recent samples, oldest first, never longer than `HISTORY_CAPACITY`
    #[serde(default)]
    pub history: VecDeque<HistoryPoint>,
}

impl SensorState {
    /// Empty state for a sensor seen for the first time
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            temp: 0.0,
            hum: 0.0,
            region: region.into(),
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Apply a reading observed at `timestamp`
    ///
    /// Appends to the history, evicts the oldest points beyond capacity and
    /// replaces the latest values. The region only changes when the reading
    /// carries one.
    pub fn apply(&mut self, reading: &SensorReading, timestamp: i64) {
        self.history.push_back(HistoryPoint {
            temp: reading.temp,
            hum: reading.hum,
            timestamp,
        });
        self.enforce_capacity();

        self.temp = reading.temp;
        self.hum = reading.hum;
        if let Some(region) = reading.region_hint() {
            self.region = region.to_string();
        }
    }

    /// Drop the oldest points until the history fits the window
    pub fn enforce_capacity(&mut self) {
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
    }

    /// Most recent history point, if any
    pub fn last_point(&self) -> Option<&HistoryPoint> {
        self.history.back()
    }
}

impl Default for SensorState {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

/// Look up `name`, synthesizing the default state for an unseen sensor
///
/// The default takes its region from the reading that triggered the lookup,
/// falling back to `DEFAULT_REGION`.
pub fn get_or_default(store: &AggregateStore, name: &str, region: Option<&str>) -> SensorState {
    store
        .get(name)
        .cloned()
        .unwrap_or_else(|| SensorState::new(region.unwrap_or(DEFAULT_REGION)))
}
