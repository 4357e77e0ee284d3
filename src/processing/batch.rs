use serde_json::Value;

use super::{ChannelId, Sample, CHANNEL_COUNT};
use crate::errors::RelayError;

/// One producer batch: a (possibly empty) payload for every channel.
///
/// A batch only exists once it has been fully validated, so the ingestion
/// path never sees a partially usable payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryBatch {
    channels: [Vec<Sample>; CHANNEL_COUNT],
}

impl TelemetryBatch {
    pub fn new(channels: [Vec<Sample>; CHANNEL_COUNT]) -> Self {
        Self { channels }
    }

    /// Validates a raw `telemetry` payload: an array of exactly
    /// `CHANNEL_COUNT` arrays of JSON numbers.
    pub fn from_value(value: &Value) -> Result<Self, RelayError> {
        let rows = value
            .as_array()
            .ok_or_else(|| RelayError::MalformedBatch("payload is not an array".to_string()))?;

        if rows.len() != CHANNEL_COUNT {
            return Err(RelayError::MalformedBatch(format!(
                "expected {} channels, got {}",
                CHANNEL_COUNT,
                rows.len()
            )));
        }

        let mut channels: [Vec<Sample>; CHANNEL_COUNT] = Default::default();
        for (index, row) in rows.iter().enumerate() {
            let values = row.as_array().ok_or_else(|| {
                RelayError::MalformedBatch(format!("channel {} is not an array", index))
            })?;

            let mut samples = Vec::with_capacity(values.len());
            for (position, value) in values.iter().enumerate() {
                let sample = value.as_f64().ok_or_else(|| {
                    RelayError::MalformedBatch(format!(
                        "channel {} sample {} is not a number: {}",
                        index, position, value
                    ))
                })?;
                samples.push(sample);
            }
            channels[index] = samples;
        }

        Ok(Self { channels })
    }

    pub fn channel(&self, channel: ChannelId) -> &[Sample] {
        &self.channels[channel.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }

    pub fn lengths(&self) -> [usize; CHANNEL_COUNT] {
        let mut lengths = [0; CHANNEL_COUNT];
        for (length, samples) in lengths.iter_mut().zip(&self.channels) {
            *length = samples.len();
        }
        lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_six_numeric_channels() {
        let batch =
            TelemetryBatch::from_value(&json!([[1, 2.5], [], [3], [], [], [-4.0]])).unwrap();
        assert_eq!(batch.lengths(), [2, 0, 1, 0, 0, 1]);
        assert_eq!(batch.channel(ChannelId::new(0).unwrap()), &[1.0, 2.5]);
        assert!(!batch.is_empty());
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let err = TelemetryBatch::from_value(&json!([[1], [2]])).unwrap_err();
        assert!(matches!(err, RelayError::MalformedBatch(_)));
    }

    #[test]
    fn rejects_non_numeric_samples() {
        let err =
            TelemetryBatch::from_value(&json!([[1], [2], ["x"], [], [], []])).unwrap_err();
        assert!(matches!(err, RelayError::MalformedBatch(msg) if msg.contains("channel 2")));
    }

    #[test]
    fn rejects_non_array_payloads() {
        assert!(TelemetryBatch::from_value(&json!({"a": 1})).is_err());
        assert!(TelemetryBatch::from_value(&json!([1, 2, 3, 4, 5, 6])).is_err());
    }
}
