//! Multi-channel telemetry relay.
//!
//! Producers push six-channel batches, the relay keeps every channel's full
//! history, streams decimated data to viewers and, once each channel holds a
//! full analysis window, hands the trailing windows to the detection service.
//! Verdicts come back as separate `detection` events and are rebroadcast.

pub mod config;
pub mod errors;
pub mod local;
pub mod processing;
pub mod utils;

pub use errors::{ConfigError, RelayError};
