//! WebSocket Connection Hub
//!
//! Tracks live connections and the topics each one follows. Publishing is
//! synchronous: each subscriber's outbox receives events in the order
//! `publish` was called. Closing a connection or unsubscribing only stops
//! delivery; it never touches aggregated sensor data.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use super::messages::{ServerMessage, Topic, WsEvent};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Queue drained by a connection's socket writer
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Capacity of the in-process event channel
    pub broadcast_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            broadcast_capacity: 1024,
        }
    }
}

struct Client {
    outbox: Outbox,
    topics: BTreeSet<Topic>,
}

/// Registry of dashboard and gateway connections
pub struct ConnectionHub {
    clients: RwLock<HashMap<ConnectionId, Client>>,
    events: broadcast::Sender<WsEvent>,
    config: HubConfig,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        let (events, _) = broadcast::channel(config.broadcast_capacity.max(1));

        Self {
            clients: RwLock::new(HashMap::new()),
            events,
            config,
        }
    }

    // Critical sections never panic, so a poisoned table is still consistent
    fn clients(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, Client>> {
        self.clients.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn clients_mut(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, Client>> {
        self.clients.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection, refusing it once the limit is reached
    pub fn register(&self, outbox: Outbox) -> Result<ConnectionId, HubError> {
        let mut clients = self.clients_mut();
        if clients.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        clients.insert(
            id.clone(),
            Client {
                outbox,
                topics: BTreeSet::new(),
            },
        );

        tracing::info!(connection_id = %id, connections = clients.len(), "WebSocket connected");
        Ok(id)
    }

    pub fn unregister(&self, id: &str) {
        if self.clients_mut().remove(id).is_some() {
            tracing::info!(connection_id = %id, "WebSocket disconnected");
        }
    }

    /// Follow the named topics; unknown names are skipped
    ///
    /// Returns the topics now followed from this request.
    pub fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut clients = self.clients_mut();
        let client = clients.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subscribed = Vec::new();
        for name in topics {
            match Topic::parse(&name) {
                Some(topic) => {
                    client.topics.insert(topic);
                    subscribed.push(name);
                }
                None => tracing::warn!(topic = %name, "Invalid topic ignored"),
            }
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed");
        Ok(subscribed)
    }

    /// Stop following topics; returns the ones that were actually followed
    pub fn unsubscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut clients = self.clients_mut();
        let client = clients.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let unsubscribed: Vec<String> = topics
            .into_iter()
            .filter(|name| Topic::parse(name).map_or(false, |t| client.topics.remove(&t)))
            .collect();

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed");
        Ok(unsubscribed)
    }

    /// Queue an event for every connection following one of its topics
    ///
    /// Each connection receives the event at most once. Returns the number
    /// of connections it was queued for.
    pub fn publish(&self, event: WsEvent) -> usize {
        let delivered = {
            let clients = self.clients();
            clients
                .values()
                .filter(|client| client.topics.iter().any(|t| event.targets(*t)))
                .filter(|client| client.outbox.send(event.message.clone()).is_ok())
                .count()
        };

        if delivered > 0 {
            tracing::trace!(topics = ?event.topics, subscribers = delivered, "Published event");
        }

        if self.events.receiver_count() > 0 {
            let _ = self.events.send(event);
        }
        delivered
    }

    /// Queue a reply for a single connection
    pub fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let clients = self.clients();
        let client = clients.get(id).ok_or(HubError::ConnectionNotFound)?;

        client.outbox.send(message).map_err(|_| HubError::SendFailed)
    }

    /// Receiver for every published event (in-process listeners)
    pub fn events(&self) -> broadcast::Receiver<WsEvent> {
        self.events.subscribe()
    }

    pub fn connection_count(&self) -> usize {
        self.clients().len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.clients()
            .values()
            .filter(|client| client.topics.contains(&topic))
            .count()
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{AggregateStore, SensorState};

    fn update_event(temp: f64) -> WsEvent {
        let mut sensors = AggregateStore::new();
        let mut state = SensorState::default();
        state.temp = temp;
        sensors.insert("A".to_string(), state);
        WsEvent::sensor_data(sensors)
    }

    fn connect(hub: &ConnectionHub, topics: &[&str]) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).unwrap();
        hub.subscribe(&id, topics.iter().map(|t| t.to_string()).collect())
            .unwrap();
        (id, rx)
    }

    #[test]
    fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (id, _rx) = connect(&hub, &[]);
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count(), 1);

        hub.unregister(&id);
        assert_eq!(hub.connection_count(), 0);
        assert!(matches!(
            hub.send_to(&id, ServerMessage::Pong),
            Err(HubError::ConnectionNotFound)
        ));
    }

    #[test]
    fn test_subscribe_skips_unknown_topics() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).unwrap();

        let subscribed = hub
            .subscribe(&id, vec!["sensor-data".to_string(), "bogus".to_string()])
            .unwrap();
        assert_eq!(subscribed, vec!["sensor-data"]);
        assert_eq!(hub.subscriber_count(Topic::SensorData), 1);

        let unsubscribed = hub
            .unsubscribe(&id, vec!["sensor-data".to_string(), "system".to_string()])
            .unwrap();
        assert_eq!(unsubscribed, vec!["sensor-data"]);
        assert_eq!(hub.subscriber_count(Topic::SensorData), 0);
    }

    #[test]
    fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig {
            max_connections: 2,
            broadcast_capacity: 16,
        });

        connect(&hub, &[]);
        connect(&hub, &[]);
        let (tx, _) = mpsc::unbounded_channel();
        assert!(matches!(
            hub.register(tx),
            Err(HubError::TooManyConnections(2))
        ));
    }

    #[test]
    fn test_publish_reaches_only_subscribers() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (_a, mut rx_a) = connect(&hub, &["sensor-data"]);
        let (_b, mut rx_b) = connect(&hub, &["system"]);

        assert_eq!(hub.publish(update_event(1.0)), 1);
        assert!(matches!(rx_a.try_recv(), Ok(ServerMessage::SensorData { .. })));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_cleared_reaches_both_topics_once() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (_a, mut sensor_only) = connect(&hub, &["sensor-data"]);
        let (_b, mut both) = connect(&hub, &["sensor-data", "system"]);

        assert_eq!(hub.publish(WsEvent::cleared()), 2);

        assert!(matches!(sensor_only.try_recv(), Ok(ServerMessage::Cleared)));
        assert!(matches!(both.try_recv(), Ok(ServerMessage::Cleared)));
        assert!(both.try_recv().is_err());
    }

    #[test]
    fn test_unregistered_connection_stops_receiving() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (id, mut rx) = connect(&hub, &["sensor-data"]);
        hub.unregister(&id);

        assert_eq!(hub.publish(update_event(1.0)), 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.subscriber_count(Topic::SensorData), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_updates_arrive_in_publish_order() {
        let hub = std::sync::Arc::new(ConnectionHub::new(HubConfig::default()));
        let (_id, mut rx) = connect(&hub, &["sensor-data"]);

        let publisher = {
            let hub = std::sync::Arc::clone(&hub);
            tokio::spawn(async move {
                for i in 0..2000 {
                    hub.publish(update_event(i as f64));
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut received = Vec::with_capacity(2000);
        while received.len() < 2000 {
            match rx.recv().await {
                Some(ServerMessage::SensorData { sensors }) => received.push(sensors["A"].temp),
                other => panic!("unexpected message: {:?}", other),
            }
        }
        publisher.await.unwrap();

        let inversions = received.windows(2).filter(|w| w[1] < w[0]).count();
        assert_eq!(inversions, 0);
        assert_eq!(received.last().copied(), Some(1999.0));
    }

    #[tokio::test]
    async fn test_publish_reaches_in_process_listeners() {
        let hub = ConnectionHub::new(HubConfig::default());
        let mut listener = hub.events();

        hub.publish(WsEvent::cleared());

        let event = listener.recv().await.unwrap();
        assert!(event.targets(Topic::System));
    }
}
