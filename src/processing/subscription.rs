use super::broadcast::OutboundEvent;
use super::buffers::{ChannelBufferStore, ChannelId};
use super::downsample::decimate;
use super::DECIMATION_STRIDE;
use crate::errors::RelayError;

/// Sentinel a viewer sends to stop watching any channel.
pub const UNSUBSCRIBE: i64 = -1;

/// Parses the channel selection carried by a `join` request.
///
/// `"-1"` means "no channel"; anything else must name a valid channel.
pub fn parse_selection(raw: &str) -> Result<Option<ChannelId>, RelayError> {
    let index: i64 = raw
        .trim()
        .parse()
        .map_err(|_| RelayError::UnparsableChannel(raw.to_string()))?;

    if index == UNSUBSCRIBE {
        Ok(None)
    } else {
        ChannelId::new(index).map(Some)
    }
}

// SUBSCRIPTION COMPONENT ------------------------------------------------------

/// The single channel the active viewer is watching, shared by every
/// connection.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionTracker {
    selected: Option<ChannelId>,
}

impl SubscriptionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ChannelId> {
        self.selected
    }

    /// Updates the selection and, for a concrete channel, builds the
    /// decimated snapshot of its whole history. Re-selecting the same channel
    /// produces a fresh snapshot.
    pub fn subscribe(
        &mut self,
        selection: Option<ChannelId>,
        store: &ChannelBufferStore,
    ) -> Option<OutboundEvent> {
        self.selected = selection;
        let channel = selection?;

        Some(OutboundEvent::Snapshot {
            channel: channel.index(),
            points: decimate(store.history(channel), DECIMATION_STRIDE).collect(),
        })
    }
}
