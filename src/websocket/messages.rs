//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! clients (dashboards and sensor gateways) and the Sensorboard server.

use serde::{Deserialize, Serialize};

use crate::aggregator::{AggregateStore, ReadingBatch};

/// Topic carrying sensor updates
pub const SENSOR_DATA_TOPIC: &str = "sensor-data";

/// Topic carrying server-wide events (e.g. a full reset)
pub const SYSTEM_TOPIC: &str = "system";

/// A channel a connection can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Topic {
    SensorData,
    System,
}

impl Topic {
    /// Parse a wire topic name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            SENSOR_DATA_TOPIC => Some(Topic::SensorData),
            SYSTEM_TOPIC => Some(Topic::System),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::SensorData => SENSOR_DATA_TOPIC,
            Topic::System => SYSTEM_TOPIC,
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// List of topics to subscribe to (e.g., "sensor-data")
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe {
        /// List of topics to unsubscribe from
        topics: Vec<String>,
    },
    /// Ping for keepalive
    Ping,
    /// Readings pushed by a sensor gateway
    SensorData {
        /// A single reading or an array of readings
        data: ReadingBatch,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sensors updated by an ingest, keyed by name
    SensorData {
        sensors: AggregateStore,
    },
    /// All sensor data was cleared (sent on both `sensor-data` and `system`)
    Cleared,
    /// Readings pushed over this connection were applied
    Accepted {
        accepted: usize,
    },
    /// Subscription confirmed
    Subscribed {
        /// Topics successfully subscribed to
        topics: Vec<String>,
    },
    /// Unsubscription confirmed
    Unsubscribed {
        /// Topics successfully unsubscribed from
        topics: Vec<String>,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
}

/// Event published through the hub
///
/// A connection subscribed to any of `topics` receives `message` once.
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub topics: Vec<Topic>,
    pub message: ServerMessage,
}

impl WsEvent {
    /// Sensors touched by one ingest
    pub fn sensor_data(sensors: AggregateStore) -> Self {
        Self {
            topics: vec![Topic::SensorData],
            message: ServerMessage::SensorData { sensors },
        }
    }

    /// Full reset, relevant to both sensor views and system listeners
    pub fn cleared() -> Self {
        Self {
            topics: vec![Topic::SensorData, Topic::System],
            message: ServerMessage::Cleared,
        }
    }

    pub fn targets(&self, topic: Topic) -> bool {
        self.topics.contains(&topic)
    }
}
