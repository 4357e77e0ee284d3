// src/config/mod.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::ConfigError;

pub const DEFAULT_ANALYSIS_ENDPOINT: &str = "http://detector:10002/v1/api/detector/detect_seism";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
    pub producer: ProducerConfig,
    pub viewer: ViewerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Outbound events buffered per viewer before it starts lagging.
    pub broadcast_capacity: usize,
    /// Inbound events queued ahead of the event loop.
    pub queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:10001".to_string(),
            broadcast_capacity: 256,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub journal_path: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ANALYSIS_ENDPOINT.to_string(),
            journal_path: Some("logs/dispatch.csv".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG` when set.
    pub filter: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,telemetry_relay=debug".to_string(),
            ansi: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ProducerConfig {
    pub relay_url: String,
    pub data_dir: String,
    pub chunk_size: usize,
    pub interval_ms: u64,
    pub simulate: bool,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:10001/ws".to_string(),
            data_dir: "./data".to_string(),
            chunk_size: 2000,
            interval_ms: 100,
            simulate: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ViewerConfig {
    pub relay_url: String,
    pub channel: i64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:10001/ws".to_string(),
            channel: 0,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&config_str).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let yaml = serde_yaml::to_string(config).map_err(ConfigError::Serialize)?;

    fs::write(path, yaml).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.yaml");

        let mut config = Config::default();
        config.server.bind_addr = "127.0.0.1:9999".to_string();
        config.producer.simulate = true;
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.server.bind_addr, "127.0.0.1:9999");
        assert!(loaded.producer.simulate);
        assert_eq!(loaded.analysis.endpoint, DEFAULT_ANALYSIS_ENDPOINT);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.yaml");
        fs::write(&path, "viewer:\n  channel: 3\n").unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.viewer.channel, 3);
        assert_eq!(loaded.producer.chunk_size, 2000);
        assert_eq!(loaded.server.queue_capacity, 1024);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.yaml");
        fs::write(&path, "server: [unclosed").unwrap();
        assert!(matches!(
            load_config(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }
}
