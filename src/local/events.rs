use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel selection sent with `join`: producers historically send the index
/// as a string, but a bare number is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinRoom {
    Text(String),
    Index(i64),
}

impl JoinRoom {
    pub fn as_selection(&self) -> String {
        match self {
            JoinRoom::Text(text) => text.clone(),
            JoinRoom::Index(index) => index.to_string(),
        }
    }
}

/// Events accepted from producers, viewers and the detection service.
///
/// Frames look like `{"event": "<name>", "data": ...}`. Telemetry payloads are
/// kept as raw JSON so batch validation happens in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    Join(JoinRoom),
    Telemetry(Value),
    Detection(Value),
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Join(_) => "join",
            InboundEvent::Telemetry(_) => "telemetry",
            InboundEvent::Detection(_) => "detection",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_join_as_text_or_number() {
        let text: InboundEvent = serde_json::from_str(r#"{"event":"join","data":"-1"}"#).unwrap();
        assert_eq!(text, InboundEvent::Join(JoinRoom::Text("-1".to_string())));

        let number: InboundEvent = serde_json::from_str(r#"{"event":"join","data":4}"#).unwrap();
        assert_eq!(number, InboundEvent::Join(JoinRoom::Index(4)));
        if let InboundEvent::Join(room) = number {
            assert_eq!(room.as_selection(), "4");
        }
    }

    #[test]
    fn telemetry_and_detection_keep_raw_payloads() {
        let telemetry: InboundEvent =
            serde_json::from_value(json!({"event": "telemetry", "data": [[1], ["bad"]]})).unwrap();
        assert_eq!(telemetry, InboundEvent::Telemetry(json!([[1], ["bad"]])));

        let detection: InboundEvent = serde_json::from_value(
            json!({"event": "detection", "data": {"label": "seismic", "score": 0.9}}),
        )
        .unwrap();
        assert_eq!(detection.name(), "detection");
    }

    #[test]
    fn unknown_events_do_not_parse() {
        assert!(serde_json::from_str::<InboundEvent>(r#"{"event":"ping"}"#).is_err());
    }
}
