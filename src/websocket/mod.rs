//! WebSocket Real-Time Streaming
//!
//! Pushes sensor updates to dashboard clients and accepts readings from
//! sensor gateways over the same connection.
//!
//! ## Topics
//!
//! - `sensor-data` - Sensors touched by each ingest
//! - `system` - Service events such as a full clear
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8082/api/v1/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['sensor-data']}));
//!   ws.send(JSON.stringify({
//!     type: 'sensor_data',
//!     data: {name: 'greenhouse', temp: 24.5, hum: 61, region: 'Norte'},
//!   }));
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError, Outbox};
pub use messages::{
    ClientMessage, ServerMessage, Topic, WsEvent, SENSOR_DATA_TOPIC, SYSTEM_TOPIC,
};
