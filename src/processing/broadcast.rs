use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use super::Sample;
use crate::errors::RelayError;

/// Events pushed to every connected viewer.
///
/// Serialised as `{"event": "<name>", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// Decimated payload of the latest batch for the watched channel.
    LiveUpdate {
        channel: usize,
        points: Vec<Sample>,
        total_length: usize,
    },
    /// Decimated full history, sent when a viewer starts watching a channel.
    Snapshot { channel: usize, points: Vec<Sample> },
    /// Analysis result relayed verbatim from the detection service.
    Verdict(Value),
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::LiveUpdate { .. } => "live_update",
            OutboundEvent::Snapshot { .. } => "snapshot",
            OutboundEvent::Verdict(_) => "verdict",
        }
    }
}

// BROADCAST COMPONENT ---------------------------------------------------------

/// Fans events out to every viewer connection.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<OutboundEvent>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.tx.subscribe()
    }

    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Sends the event to all viewers. Failures are logged and swallowed;
    /// the returned error is informational only.
    pub fn emit(&self, event: OutboundEvent) -> Result<usize, RelayError> {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::trace!(event = name, receivers, "event broadcast");
                Ok(receivers)
            }
            Err(_) => {
                let err = RelayError::BroadcastFailure {
                    event: name,
                    reason: "no connected viewers".to_string(),
                };
                tracing::debug!(%err, "dropping event");
                Err(err)
            }
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialise_with_name_and_data() {
        let event = OutboundEvent::Snapshot {
            channel: 2,
            points: vec![1.0, 49.0],
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "snapshot", "data": {"channel": 2, "points": [1.0, 49.0]}})
        );

        let verdict = OutboundEvent::Verdict(json!({"label": "seismic", "score": 0.9}));
        assert_eq!(
            serde_json::to_value(&verdict).unwrap(),
            json!({"event": "verdict", "data": {"label": "seismic", "score": 0.9}})
        );
    }

    #[tokio::test]
    async fn emit_reaches_every_viewer() {
        let broadcaster = Broadcaster::new(8);
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        let event = OutboundEvent::Verdict(json!([true, 12.5]));
        assert_eq!(broadcaster.emit(event.clone()), Ok(2));

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn emit_without_viewers_is_swallowed() {
        let broadcaster = Broadcaster::new(8);
        let result = broadcaster.emit(OutboundEvent::Verdict(Value::Null));
        assert!(matches!(
            result,
            Err(RelayError::BroadcastFailure { event: "verdict", .. })
        ));
    }
}
