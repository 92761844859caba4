//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::RuntimeFlavor;
use tokio::sync::RwLock;

use crate::aggregator::{
    IngestSummary, ReadingBatch, ReadingError, SensorAggregator, VisibilityFilter,
};
use crate::storage::KeyValueStore;
use crate::websocket::{ConnectionHub, HubConfig, WsEvent};

/// Shared application state for all handlers
///
/// Owns the aggregator and the visibility filter; handlers never touch the
/// raw mapping, only the entry points exposed here and on the aggregator.
#[derive(Clone)]
pub struct AppState {
    /// Sensor reading aggregator
    pub aggregator: Arc<RwLock<SensorAggregator>>,
    /// Hidden-sensor filter
    pub visibility: Arc<RwLock<VisibilityFilter>>,
    /// Backing key-value store, shared by the aggregator and the filter
    pub store: Arc<dyn KeyValueStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for real-time streaming
    pub ws_hub: Arc<ConnectionHub>,
}

impl AppState {
    /// Create state backed by `store`, loading any persisted sensors
    pub fn new(store: Arc<dyn KeyValueStore>, config: ApiConfig) -> Self {
        Self::with_ws_config(store, config, HubConfig::default())
    }

    /// Create AppState with custom WebSocket hub configuration
    pub fn with_ws_config(
        store: Arc<dyn KeyValueStore>,
        config: ApiConfig,
        hub_config: HubConfig,
    ) -> Self {
        let aggregator = SensorAggregator::load(Arc::clone(&store));
        let visibility = VisibilityFilter::load(Arc::clone(&store));

        Self {
            aggregator: Arc::new(RwLock::new(aggregator)),
            visibility: Arc::new(RwLock::new(visibility)),
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
            ws_hub: Arc::new(ConnectionHub::new(hub_config)),
        }
    }

    /// Validate and ingest a batch, then notify `sensor-data` subscribers
    ///
    /// This is the event-source boundary: readings that break the channel
    /// contract are rejected here and the aggregator is left untouched.
    /// The update is published before the write lock is released, so
    /// subscribers see updates in the order they were applied.
    pub async fn ingest(&self, batch: ReadingBatch) -> Result<IngestSummary, ReadingError> {
        batch.validate(self.config.max_batch_size)?;

        let mut aggregator = self.aggregator.write().await;
        let summary = blocking_io(|| aggregator.ingest(batch));
        self.ws_hub.publish(WsEvent::sensor_data(summary.updated.clone()));
        drop(aggregator);

        Ok(summary)
    }

    /// Clear all sensors and notify `sensor-data` and `system` subscribers
    pub async fn clear(&self) {
        let mut aggregator = self.aggregator.write().await;
        blocking_io(|| aggregator.clear());
        self.ws_hub.publish(WsEvent::cleared());
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count()
    }
}

/// Run a store write from async code
///
/// Store writes are synchronous (`FileStore` fsyncs). On a multi-threaded
/// runtime the worker is handed over to the blocking pool for the duration
/// so other tasks keep running; elsewhere the write runs inline.
pub(crate) fn blocking_io<R>(f: impl FnOnce() -> R) -> R {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins (empty = permissive)
    pub cors_origins: Vec<String>,
    /// Maximum readings accepted in one batch
    pub max_batch_size: usize,
    /// Default number of history points in a sensor detail view
    pub recent_history: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            cors_origins: Vec::new(),
            max_batch_size: 1000,
            recent_history: 5,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SensorReading;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_ingest_validates_before_applying() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), ApiConfig::default());

        let batch = ReadingBatch::Many(vec![
            SensorReading::new("A", 20.0, 40.0),
            SensorReading::new("B", f64::NAN, 40.0),
        ]);
        let result = state.ingest(batch).await;

        assert!(matches!(result, Err(ReadingError::NonFiniteTemp { .. })));
        assert!(state.aggregator.read().await.is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_ingest_and_clear() {
        let state = AppState::new(Arc::new(MemoryStore::new()), ApiConfig::default());

        let summary = state
            .ingest(SensorReading::new("A", 20.0, 40.0).into())
            .await
            .unwrap();
        assert_eq!(summary.accepted, 1);
        assert_eq!(state.aggregator.read().await.len(), 1);

        state.clear().await;
        assert!(state.aggregator.read().await.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_batch_limit_from_config() {
        let config = ApiConfig {
            max_batch_size: 1,
            ..Default::default()
        };
        let state = AppState::new(Arc::new(MemoryStore::new()), config);

        let batch = ReadingBatch::Many(vec![
            SensorReading::new("A", 1.0, 1.0),
            SensorReading::new("B", 1.0, 1.0),
        ]);
        assert!(matches!(
            state.ingest(batch).await,
            Err(ReadingError::BatchTooLarge { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_file_backed_ingest_on_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(crate::storage::FileStore::open(dir.path()).unwrap());
        let state = AppState::new(store.clone(), ApiConfig::default());

        let summary = state
            .ingest(SensorReading::new("A", 20.0, 40.0).into())
            .await
            .unwrap();
        assert!(summary.persisted);
        assert!(store.get(crate::aggregator::SENSORS_KEY).unwrap().is_some());

        state.clear().await;
        assert_eq!(
            store.get(crate::aggregator::SENSORS_KEY).unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_blocking_io_outside_runtime() {
        assert_eq!(blocking_io(|| 7), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ingests_publish_in_applied_order() {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryStore::new()),
            ApiConfig::default(),
        ));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let id = state.ws_hub.register(tx).unwrap();
        state
            .ws_hub
            .subscribe(&id, vec!["sensor-data".to_string()])
            .unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|worker| {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    for i in 0..50 {
                        let reading = SensorReading::new("A", (worker * 100 + i) as f64, 0.0);
                        state.ingest(reading.into()).await.unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // Consecutive updates must chain: the point before the newest one in
        // each update is the newest point of the update received before it.
        let mut previous: Option<crate::aggregator::HistoryPoint> = None;
        for _ in 0..400 {
            match rx.recv().await {
                Some(crate::websocket::ServerMessage::SensorData { sensors }) => {
                    let history = &sensors["A"].history;
                    if let Some(prev) = previous {
                        assert_eq!(history.get(history.len() - 2), Some(&prev));
                    }
                    previous = history.back().copied();
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }

        let final_state = state.aggregator.read().await.sensor("A").cloned().unwrap();
        assert_eq!(previous, final_state.history.back().copied());
    }

    #[tokio::test]
    async fn test_clear_notifies_sensor_data_subscribers() {
        let state = AppState::new(Arc::new(MemoryStore::new()), ApiConfig::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let id = state.ws_hub.register(tx).unwrap();
        state
            .ws_hub
            .subscribe(&id, vec!["sensor-data".to_string()])
            .unwrap();

        state.clear().await;
        assert!(matches!(
            rx.try_recv(),
            Ok(crate::websocket::ServerMessage::Cleared)
        ));
    }

    #[test]
    fn test_addr() {
        assert_eq!(ApiConfig::new("127.0.0.1", 9000).addr(), "127.0.0.1:9000");
    }
}
