//! Core event records.

use crate::{timestamp, EventType};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event-type-specific payload.
pub type Payload = serde_json::Map<String, Value>;

/// Convert a JSON value into a payload; non-objects become empty.
pub fn payload_from(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// One immutable lifecycle record, written as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// When the event was recorded.
    #[serde(rename = "ts", with = "timestamp::millis")]
    pub timestamp: DateTime<Utc>,
    /// Event kind.
    #[serde(rename = "event")]
    pub event_type: EventType,
    /// Opaque host session identifier.
    pub session_id: String,
    /// Per-process sequence number.
    #[serde(rename = "seq")]
    pub sequence: u64,
    /// Event-type-specific data.
    #[serde(rename = "data", default)]
    pub payload: Payload,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn new(
        event_type: EventType,
        session_id: impl Into<String>,
        sequence: u64,
        payload: Payload,
    ) -> Self {
        Self::at(Utc::now(), event_type, session_id, sequence, payload)
    }

    /// Create an event with an explicit timestamp, truncated to the
    /// millisecond precision of the log line.
    pub fn at(
        timestamp: DateTime<Utc>,
        event_type: EventType,
        session_id: impl Into<String>,
        sequence: u64,
        payload: Payload,
    ) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(3),
            event_type,
            session_id: session_id.into(),
            sequence,
            payload,
        }
    }

    /// UTC day this event belongs to.
    pub fn partition_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Serialize as one log line, without the trailing newline.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse one log line.
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Look up a string field in the payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Look up a numeric field in the payload.
    pub fn data_f64(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(Value::as_f64)
    }
}

/// An event relabelled for the remote sink and staged for delivery.
///
/// Same shape as [`Event`], but `event` carries the remote vocabulary, so it
/// is kept as a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
    pub ts: String,
    pub event: String,
    pub session_id: String,
    pub seq: u64,
    #[serde(default)]
    pub data: Payload,
}

impl From<&Event> for QueuedEvent {
    fn from(event: &Event) -> Self {
        Self {
            ts: timestamp::format_millis(&event.timestamp),
            event: event.event_type.remote_name().to_string(),
            session_id: event.session_id.clone(),
            seq: event.sequence,
            data: event.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Event {
        let ts = Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0).unwrap();
        Event::at(
            ts,
            EventType::ToolStart,
            "S1",
            3,
            payload_from(json!({"tool_name": "Read", "correlation_id": "abc123def456"})),
        )
    }

    #[test]
    fn test_line_uses_wire_field_names() {
        let line = sample().to_json_line().unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["ts"], "2026-10-15T08:30:00.000Z");
        assert_eq!(value["event"], "tool_start");
        assert_eq!(value["session_id"], "S1");
        assert_eq!(value["seq"], 3);
        assert_eq!(value["data"]["tool_name"], "Read");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_timestamp_matches_written_line() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 15, 21, 2, 30).unwrap()
            + chrono::Duration::nanoseconds(58_251_980);
        let event = Event::at(ts, EventType::Stop, "S1", 1, Payload::new());

        assert_eq!(timestamp::format_millis(&event.timestamp), "2026-10-15T21:02:30.058Z");
        let line = event.to_json_line().unwrap();
        assert_eq!(Event::from_json_line(&line).unwrap(), event);
    }

    #[test]
    fn test_parse_line_written_elsewhere() {
        let line = r#"{"ts":"2026-10-15T08:30:00.120+00:00","event":"tool_end","session_id":"S9","seq":7,"data":{"duration_ms":12.5}}"#;
        let event = Event::from_json_line(line).unwrap();

        assert_eq!(event.event_type, EventType::ToolEnd);
        assert_eq!(event.sequence, 7);
        assert_eq!(event.data_f64("duration_ms"), Some(12.5));
        assert_eq!(event.partition_date(), NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
    }

    #[test]
    fn test_missing_data_defaults_to_empty() {
        let line = r#"{"ts":"2026-10-15T08:30:00.000Z","event":"pre_compact","session_id":"S1","seq":1}"#;
        let event = Event::from_json_line(line).unwrap();
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_queued_event_relabels_type() {
        let queued = QueuedEvent::from(&sample());
        assert_eq!(queued.event, "tool_use");
        assert_eq!(queued.ts, "2026-10-15T08:30:00.000Z");
        assert_eq!(queued.seq, 3);
        assert_eq!(queued.data["correlation_id"], "abc123def456");
    }

    #[test]
    fn test_payload_from_non_object() {
        assert!(payload_from(json!([1, 2])).is_empty());
        assert_eq!(payload_from(json!({"a": 1})).len(), 1);
    }
}
