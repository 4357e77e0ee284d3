use std::fmt;

use super::{Sample, CHANNEL_COUNT};
use crate::errors::RelayError;

// CHANNEL COMPONENT -----------------------------------------------------------

/// Index of one of the fixed telemetry channels, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(usize);

impl ChannelId {
    pub fn new(index: i64) -> Result<Self, RelayError> {
        if (0..CHANNEL_COUNT as i64).contains(&index) {
            Ok(Self(index as usize))
        } else {
            Err(RelayError::InvalidChannel {
                index,
                count: CHANNEL_COUNT,
            })
        }
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..CHANNEL_COUNT).map(ChannelId)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// BUFFER COMPONENT ------------------------------------------------------------

/// Append-only sample history for every channel.
///
/// Buffers are never truncated: memory grows for as long as the process runs,
/// which is acceptable for a bounded observation session.
#[derive(Debug, Clone, Default)]
pub struct ChannelBufferStore {
    buffers: [Vec<Sample>; CHANNEL_COUNT],
}

impl ChannelBufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, channel: ChannelId, samples: &[Sample]) {
        if samples.is_empty() {
            return;
        }
        self.buffers[channel.index()].extend_from_slice(samples);
    }

    /// Index-checked variant of [`append`](Self::append) for raw caller input.
    pub fn append_at(&mut self, index: i64, samples: &[Sample]) -> Result<(), RelayError> {
        let channel = ChannelId::new(index)?;
        self.append(channel, samples);
        Ok(())
    }

    pub fn length(&self, channel: ChannelId) -> usize {
        self.buffers[channel.index()].len()
    }

    /// Last `n` samples of the channel, or the whole buffer when it is shorter.
    pub fn tail(&self, channel: ChannelId, n: usize) -> &[Sample] {
        let buffer = &self.buffers[channel.index()];
        &buffer[buffer.len().saturating_sub(n)..]
    }

    pub fn history(&self, channel: ChannelId) -> &[Sample] {
        &self.buffers[channel.index()]
    }
}
