//! Wire payload emitted by the agent when it finishes a unit of work.

use serde_json::{Map, Value};

/// The one completion type every built-in handler understands.
pub const AGENT_TURN_COMPLETE: &str = "agent-turn-complete";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("payload is empty")]
    Empty,
    #[error("payload is not valid JSON: {message}")]
    Malformed { message: String },
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has no string `type` field")]
    MissingType,
}

/// A parsed notification event.
///
/// Field extraction is lenient: a field with the wrong JSON type is treated
/// as absent rather than rejecting the whole event. Only a missing `type`
/// (or a payload that is not an object) makes the event unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub kind: String,
    pub thread_id: Option<String>,
    pub turn_id: Option<String>,
    pub cwd: Option<String>,
    pub last_assistant_message: Option<String>,
    pub input_messages: Vec<String>,
    /// The payload exactly as received, forwarded verbatim to handlers.
    pub raw: String,
}

impl NotificationEvent {
    pub fn parse(raw: &str) -> Result<Self, EventError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EventError::Empty);
        }

        let value: Value = serde_json::from_str(trimmed).map_err(|err| EventError::Malformed {
            message: err.to_string(),
        })?;
        let Value::Object(map) = value else {
            return Err(EventError::NotAnObject);
        };

        let kind = string_field(&map, "type").ok_or(EventError::MissingType)?;
        if kind.is_empty() {
            return Err(EventError::MissingType);
        }

        Ok(Self {
            kind,
            thread_id: string_field(&map, "thread-id"),
            turn_id: string_field(&map, "turn-id"),
            cwd: string_field(&map, "cwd"),
            last_assistant_message: string_field(&map, "last-assistant-message"),
            input_messages: input_messages(&map),
            raw: trimmed.to_string(),
        })
    }

    pub fn is_turn_complete(&self) -> bool {
        self.kind == AGENT_TURN_COMPLETE
    }

    /// Thread id, or `unknown` when the producer did not send one.
    pub fn thread_key(&self) -> &str {
        match self.thread_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => "unknown",
        }
    }

    pub fn turn_key(&self) -> &str {
        self.turn_id.as_deref().unwrap_or("")
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn input_messages(map: &Map<String, Value>) -> Vec<String> {
    let Some(Value::Array(items)) = map.get("input-messages") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Null | Value::Bool(false) => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{EventError, NotificationEvent};

    #[test]
    fn parses_turn_complete_payload() {
        let raw = r#"{"type":"agent-turn-complete","thread-id":"t1","turn-id":"u1","cwd":"/repo","last-assistant-message":"Done.","input-messages":["fix it",""]}"#;
        let event = NotificationEvent::parse(raw).expect("parse event");

        assert!(event.is_turn_complete());
        assert_eq!(event.thread_key(), "t1");
        assert_eq!(event.turn_key(), "u1");
        assert_eq!(event.cwd.as_deref(), Some("/repo"));
        assert_eq!(event.last_assistant_message.as_deref(), Some("Done."));
        assert_eq!(event.input_messages, vec!["fix it".to_string()]);
        assert_eq!(event.raw, raw);
    }

    #[test]
    fn rejects_non_objects_and_missing_type() {
        assert_eq!(NotificationEvent::parse("   "), Err(EventError::Empty));
        assert!(matches!(
            NotificationEvent::parse("{not json"),
            Err(EventError::Malformed { .. })
        ));
        assert_eq!(
            NotificationEvent::parse("[1,2]"),
            Err(EventError::NotAnObject)
        );
        assert_eq!(
            NotificationEvent::parse(r#"{"thread-id":"t1"}"#),
            Err(EventError::MissingType)
        );
        assert_eq!(
            NotificationEvent::parse(r#"{"type":""}"#),
            Err(EventError::MissingType)
        );
        assert_eq!(
            NotificationEvent::parse(r#"{"type":7}"#),
            Err(EventError::MissingType)
        );
    }

    #[test]
    fn wrongly_typed_fields_are_treated_as_absent() {
        let event = NotificationEvent::parse(r#"{"type":"x","thread-id":5,"turn-id":null}"#)
            .expect("parse event");
        assert_eq!(event.thread_key(), "unknown");
        assert_eq!(event.turn_key(), "");
        assert!(!event.is_turn_complete());
    }
}
