use std::path::PathBuf;

use thiserror::Error;

/// Failures raised along the ingestion path.
///
/// None of these are allowed to stop the event loop: the component that hits
/// one logs it and carries on with the next event.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelayError {
    #[error("invalid channel index {index}, expected 0..{count}")]
    InvalidChannel { index: i64, count: usize },

    #[error("channel selection `{0}` is not an integer")]
    UnparsableChannel(String),

    #[error("malformed telemetry batch: {0}")]
    MalformedBatch(String),

    #[error("analysis dispatch failed: {0}")]
    DispatchFailure(String),

    #[error("broadcast of `{event}` failed: {reason}")]
    BroadcastFailure { event: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
