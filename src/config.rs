//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api;
use crate::websocket::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ServerConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub websocket: WebSocketConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("sensorboard").to_string_lossy().to_string())
        .unwrap_or_else(|| "./sensorboard_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Data directory with a leading `~/` expanded to the home directory
    pub fn data_path(&self) -> PathBuf {
        match (self.data_dir.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.data_dir),
        }
    }
}

/// API server configuration (the `[api]` table)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_max_batch_size() -> usize {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

/// Dashboard read-model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Points returned by the sensor detail view when no limit is given
    #[serde(default = "default_recent_history")]
    pub recent_history: usize,
}

fn default_recent_history() -> usize {
    5
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_history: default_recent_history(),
        }
    }
}

/// WebSocket hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_max_connections() -> usize {
    1000
}

fn default_broadcast_capacity() -> usize {
    1024
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("sensorboard").join("config.toml")),
            Some(PathBuf::from("/etc/sensorboard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(data_dir) = lookup("SENSORBOARD_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Some(host) = lookup("SENSORBOARD_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("SENSORBOARD_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid SENSORBOARD_API_PORT"),
            }
        }

        if let Some(level) = lookup("SENSORBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SENSORBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Settings consumed by the HTTP layer
    pub fn api_config(&self) -> api::ApiConfig {
        api::ApiConfig {
            host: self.api.host.clone(),
            port: self.api.port,
            cors_origins: self.api.cors_origins.clone(),
            max_batch_size: self.api.max_batch_size,
            recent_history: self.dashboard.recent_history,
        }
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            max_connections: self.websocket.max_connections,
            broadcast_capacity: self.websocket.broadcast_capacity,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Sensorboard Configuration
#
# Environment variables override these settings:
# - SENSORBOARD_DATA_DIR
# - SENSORBOARD_API_HOST
# - SENSORBOARD_API_PORT
# - SENSORBOARD_LOG_LEVEL
# - SENSORBOARD_LOG_FORMAT

[storage]
# Directory holding sensors.json and hiddenSensors.json
data_dir = "~/.local/share/sensorboard"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins (empty allows any origin)
cors_origins = []

# Largest batch accepted by a single ingest
max_batch_size = 1000

[dashboard]
# History points shown by the sensor detail view by default
recent_history = 5

[websocket]
# Maximum concurrent WebSocket connections
max_connections = 1000

# Capacity of the in-process event channel
broadcast_capacity = 1024

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.api.max_batch_size, 1000);
        assert!(config.api.cors_origins.is_empty());
        assert_eq!(config.dashboard.recent_history, 5);
        assert_eq!(config.websocket.max_connections, 1000);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config(), Path::new("default.toml")).unwrap();
        assert_eq!(config.storage.data_dir, "~/.local/share/sensorboard");
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.dashboard.recent_history, 5);
        assert_eq!(config.websocket.broadcast_capacity, 1024);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nport = 9000\n\n[logging]\nformat = \"json\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.dashboard.recent_history, 5);
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/sensorboard.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nport = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SENSORBOARD_DATA_DIR", "/tmp/sensors"),
            ("SENSORBOARD_API_HOST", "127.0.0.1"),
            ("SENSORBOARD_API_PORT", "9100"),
            ("SENSORBOARD_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage.data_dir, "/tmp/sensors");
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_data_path_expands_home() {
        let storage = StorageConfig {
            data_dir: "/var/lib/sensorboard".to_string(),
        };
        assert_eq!(storage.data_path(), PathBuf::from("/var/lib/sensorboard"));

        if let Some(home) = dirs::home_dir() {
            let storage = StorageConfig {
                data_dir: "~/sensors".to_string(),
            };
            assert_eq!(storage.data_path(), home.join("sensors"));
        }
    }

    #[test]
    fn test_invalid_port_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "SENSORBOARD_API_PORT").then(|| "http".to_string()));
        assert_eq!(config.api.port, 8082);
    }

    #[test]
    fn test_api_and_hub_config() {
        let mut config = Config::default();
        config.api.cors_origins = vec!["http://localhost:3000".to_string()];
        config.dashboard.recent_history = 8;
        config.websocket.max_connections = 3;

        let api = config.api_config();
        assert_eq!(api.addr(), "0.0.0.0:8082");
        assert_eq!(api.recent_history, 8);
        assert_eq!(api.cors_origins.len(), 1);

        assert_eq!(config.hub_config().max_connections, 3);
    }
}
