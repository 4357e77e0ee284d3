use std::sync::Arc;

use serde_json::Value;

use super::batch::TelemetryBatch;
use super::broadcast::{Broadcaster, OutboundEvent};
use super::buffers::{ChannelBufferStore, ChannelId};
use super::dispatch::Dispatcher;
use super::downsample::decimate;
use super::subscription::{parse_selection, SubscriptionTracker};
use super::triggers::window::{Evaluation, WindowTrigger};
use super::{CHANNEL_COUNT, DECIMATION_STRIDE};
use crate::errors::RelayError;

// -----------------------------------------------------------------------------
// RELAY CONTEXT
// -----------------------------------------------------------------------------

/// What happened to the trigger on a cycle-completing batch.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    InsufficientData { channel: ChannelId, length: usize },
    Dispatched,
}

/// Summary of one accepted batch, mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub appended: [usize; CHANNEL_COUNT],
    pub live_update: bool,
    pub trigger: Option<TriggerOutcome>,
}

/// All shared relay state: buffers, cycle counter and subscription.
///
/// Exactly one instance exists per running relay. It is owned by the event
/// loop, which is the only caller of the `&mut self` methods, so batches,
/// joins and detections never interleave.
pub struct RelayContext {
    store: ChannelBufferStore,
    subscription: SubscriptionTracker,
    trigger: WindowTrigger,
    dispatcher: Arc<dyn Dispatcher>,
    broadcaster: Broadcaster,
}

impl RelayContext {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, broadcaster: Broadcaster) -> Self {
        Self {
            store: ChannelBufferStore::new(),
            subscription: SubscriptionTracker::new(),
            trigger: WindowTrigger::default(),
            dispatcher,
            broadcaster,
        }
    }

    pub fn store(&self) -> &ChannelBufferStore {
        &self.store
    }

    pub fn subscription(&self) -> Option<ChannelId> {
        self.subscription.current()
    }

    pub fn cycle(&self) -> usize {
        self.trigger.cycle().value()
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Validates a raw `telemetry` payload and ingests it. A malformed
    /// payload is rejected whole, before any buffer is touched.
    pub fn on_telemetry(&mut self, payload: &Value) -> Result<BatchReport, RelayError> {
        let batch = TelemetryBatch::from_value(payload)?;
        Ok(self.ingest(&batch))
    }

    pub fn ingest(&mut self, batch: &TelemetryBatch) -> BatchReport {
        let mut report = BatchReport {
            appended: batch.lengths(),
            ..Default::default()
        };

        for channel in ChannelId::all() {
            self.store.append(channel, batch.channel(channel));
        }
        tracing::debug!(appended = ?report.appended, "batch ingested");

        if let Some(channel) = self.subscription.current() {
            let samples = batch.channel(channel);
            if !samples.is_empty() {
                let total_length = self.store.length(channel);
                let _ = self.broadcaster.emit(OutboundEvent::LiveUpdate {
                    channel: channel.index(),
                    points: decimate(samples, DECIMATION_STRIDE).collect(),
                    total_length,
                });
                tracing::debug!(%channel, total_length, "live update sent");
                report.live_update = true;
            }
        }

        report.trigger = self.trigger.on_batch(&self.store).map(|evaluation| match evaluation {
            Evaluation::InsufficientData { channel, length } => {
                tracing::info!(%channel, length, "not enough data for analysis");
                TriggerOutcome::InsufficientData { channel, length }
            }
            Evaluation::Ready(window) => {
                tracing::info!("dispatching analysis window");
                self.dispatcher.dispatch(window);
                TriggerOutcome::Dispatched
            }
        });

        report
    }

    /// Handles a `join` request carrying a raw channel selection.
    pub fn on_join(&mut self, raw: &str) -> Result<Option<ChannelId>, RelayError> {
        let selection = parse_selection(raw)?;
        self.subscribe(selection);
        Ok(selection)
    }

    pub fn subscribe(&mut self, selection: Option<ChannelId>) {
        match self.subscription.subscribe(selection, &self.store) {
            Some(snapshot) => {
                tracing::info!(channel = ?selection, "sending history snapshot");
                let _ = self.broadcaster.emit(snapshot);
            }
            None => tracing::info!("viewer unsubscribed"),
        }
    }

    /// Relays an externally produced verdict to every viewer, unmodified.
    pub fn on_detection(&mut self, payload: Value) {
        tracing::info!(verdict = %payload, "detection received");
        let _ = self.broadcaster.emit(OutboundEvent::Verdict(payload));
    }
}
