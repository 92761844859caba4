//! Sensorboard REST API
//!
//! HTTP API layer for Sensorboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Ingest
//! - `POST /api/v1/ingest` - One reading or an array of readings
//!
//! ## Sensors
//! - `GET /api/v1/sensors` - Snapshot of all sensors
//! - `DELETE /api/v1/sensors` - Clear all sensors
//! - `GET /api/v1/sensors/:name` - Sensor detail (`?limit=`, `?all=true`)
//! - `GET /api/v1/sensors/:name/stats` - Sensor statistics
//! - `GET /api/v1/regions` - Distinct regions
//! - `GET /api/v1/dashboard` - Visible sensors grouped by region
//!
//! ## Visibility
//! - `GET /api/v1/hidden` - Hidden sensor names
//! - `POST /api/v1/hidden/:name` - Hide a sensor
//! - `DELETE /api/v1/hidden/:name` - Show a sensor again
//!
//! ## Health
//! - `GET /health/live` - Liveness check
//! - `GET /health/ready` - Readiness check
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Real-time `sensor-data` channel
//!
//! # Example
//!
//! ```rust,ignore
//! use sensorboard::api::{serve, ApiConfig, AppState};
//! use sensorboard::storage::FileStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::open("./sensorboard_data")?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        // Ingest routes
        .route("/ingest", post(routes::ingest::ingest))
        // Sensor routes
        .route(
            "/sensors",
            get(routes::sensors::list_sensors).delete(routes::sensors::clear_sensors),
        )
        .route("/sensors/:name", get(routes::sensors::get_sensor))
        .route("/sensors/:name/stats", get(routes::sensors::get_sensor_stats))
        .route("/regions", get(routes::sensors::list_regions))
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        // Visibility routes
        .route("/hidden", get(routes::hidden::list_hidden))
        .route(
            "/hidden/:name",
            post(routes::hidden::hide_sensor).delete(routes::hidden::show_sensor),
        )
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS for the configured origins, permissive when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Sensorboard API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Sensorboard API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
