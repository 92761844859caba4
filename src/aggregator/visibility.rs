//! Sensor visibility filter
//!
//! A presentation-scoped set of hidden sensor names. Hiding a sensor only
//! removes it from dashboard listings; its aggregated history is untouched.
//! The set is persisted under its own key, independent of the aggregate.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::aggregator::error::ParseError;
use crate::storage::KeyValueStore;

/// Persistence key of the hidden-name set
pub const HIDDEN_SENSORS_KEY: &str = "hiddenSensors";

/// Persisted set of sensor names excluded from display
pub struct VisibilityFilter {
    hidden: BTreeSet<String>,
    store: Arc<dyn KeyValueStore>,
}

impl VisibilityFilter {
    /// Load the hidden set from `store`, empty if absent or malformed
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let hidden = match store.get(HIDDEN_SENSORS_KEY) {
            Ok(Some(raw)) => parse_hidden_sensors(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding persisted hidden sensors");
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read hidden sensors, starting empty");
                BTreeSet::new()
            }
        };

        Self { hidden, store }
    }

    /// Hide `name` from display. Returns true if the set changed.
    pub fn evict(&mut self, name: &str) -> bool {
        let changed = self.hidden.insert(name.to_string());
        self.persist();
        if changed {
            tracing::info!(sensor = %name, "Sensor hidden");
        }
        changed
    }

    /// Show `name` again. Returns true if the set changed.
    pub fn restore(&mut self, name: &str) -> bool {
        let changed = self.hidden.remove(name);
        self.persist();
        if changed {
            tracing::info!(sensor = %name, "Sensor restored");
        }
        changed
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.contains(name)
    }

    /// Hidden names in sorted order
    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.hidden)
            .map_err(crate::storage::StorageError::from)
            .and_then(|json| self.store.set(HIDDEN_SENSORS_KEY, &json));

        if let Err(e) = result {
            tracing::warn!(error = %e, key = HIDDEN_SENSORS_KEY, "Failed to persist hidden sensors");
        }
    }
}

/// Decode a persisted hidden-name array
pub fn parse_hidden_sensors(raw: &str) -> Result<BTreeSet<String>, ParseError> {
    serde_json::from_str(raw).map_err(|e| ParseError::Malformed {
        key: HIDDEN_SENSORS_KEY,
        error: e.to_string(),
    })
}
