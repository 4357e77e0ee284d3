pub mod batch;
pub mod broadcast;
pub mod buffers;
pub mod dispatch;
pub mod downsample;
pub mod ingestion;
pub mod subscription;
pub mod triggers;

// -----------------------------------------------------------------------------
// PIPELINE CONSTANTS
// -----------------------------------------------------------------------------

/// Number of telemetry channels fed by every producer batch.
pub const CHANNEL_COUNT: usize = 6;

/// Every `DECIMATION_STRIDE`th sample is kept when sending data to viewers.
pub const DECIMATION_STRIDE: usize = 48;

/// Batches per ingestion cycle; the trigger is evaluated when a cycle completes.
pub const TRIGGER_CYCLE_LENGTH: usize = 4;

/// Trailing samples per channel handed to the analysis service.
pub const ANALYSIS_WINDOW_LEN: usize = 21_000;

pub type Sample = f64;

pub use batch::TelemetryBatch;
pub use broadcast::{Broadcaster, OutboundEvent};
pub use buffers::{ChannelBufferStore, ChannelId};
pub use dispatch::{Dispatcher, HttpDispatcher};
pub use downsample::decimate;
pub use ingestion::{BatchReport, RelayContext};
pub use subscription::SubscriptionTracker;
pub use triggers::window::{AnalysisWindow, Evaluation, IngestionCycle, WindowTrigger};
