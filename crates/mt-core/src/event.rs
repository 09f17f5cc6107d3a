//! Domain events for the mood tracker event log.
//!
//! Events are immutable and append-only. The creation timestamp doubles as
//! the event's unique identifier and as the projection key, so every
//! comparison in the engine works on the canonical string form produced by
//! [`format_timestamp`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An entry in the append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// When the event was created. Also the event's identity.
    #[serde(rename = "createdAt", with = "timestamp_key")]
    pub created_at: DateTime<Utc>,
    /// What happened, with its payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Canonical projection key for this event.
    #[must_use]
    pub fn id(&self) -> String {
        format_timestamp(self.created_at)
    }
}

/// The kind of change an event applies, with its payload.
///
/// Serializes to the versioned wire shape:
/// `{"type": "v1/moods/create", "payload": {…}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventKind {
    /// A new mood sample keyed by the event's creation time.
    #[serde(rename = "v1/moods/create")]
    MoodCreate(Mood),
    /// A partial update merged into an existing mood.
    #[serde(rename = "v1/moods/update")]
    MoodUpdate(MoodUpdate),
    /// Removal of the mood keyed by the payload.
    #[serde(rename = "v1/moods/delete")]
    MoodDelete(String),
    /// A new meditation session keyed by the event's creation time.
    #[serde(rename = "v1/meditations/create")]
    MeditationCreate(Meditation),
    /// Removal of the meditation keyed by the payload.
    #[serde(rename = "v1/meditations/delete")]
    MeditationDelete(String),
}

impl EventKind {
    /// Wire type string for this kind.
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::MoodCreate(_) => "v1/moods/create",
            Self::MoodUpdate(_) => "v1/moods/update",
            Self::MoodDelete(_) => "v1/moods/delete",
            Self::MeditationCreate(_) => "v1/meditations/create",
            Self::MeditationDelete(_) => "v1/meditations/delete",
        }
    }
}

/// A mood sample on the inclusive 0 to 10 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mood {
    pub mood: f64,
    /// Free-text notes; whitespace-separated words become tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Key of the update event that last modified this sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Fields merged into an existing mood by a `v1/moods/update` event.
///
/// Only present fields are applied; `id` names the target and is never
/// merged itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A completed meditation session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meditation {
    /// Duration of the session in seconds.
    pub seconds: u32,
}

/// Formats a timestamp in the canonical key form: RFC 3339 with millisecond
/// precision and a `Z` suffix (e.g. `2021-01-01T00:00:00.000Z`).
///
/// Lexicographic order on canonical keys equals chronological order, which
/// the range selectors rely on.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|parsed| parsed.with_timezone(&Utc))
}

/// Parses a projection key, warning when it is not a valid timestamp.
///
/// Id sequences only hold keys produced by [`format_timestamp`], so a parse
/// failure indicates a corrupted log entry; callers treat it as missing
/// data rather than failing the whole aggregate.
pub(crate) fn key_time(id: &str) -> Option<DateTime<Utc>> {
    match parse_timestamp(id) {
        Ok(timestamp) => Some(timestamp),
        Err(error) => {
            tracing::warn!(id, %error, "ignoring unparseable timestamp key");
            None
        }
    }
}

/// Serde adapter keeping `createdAt` in the canonical millisecond form on
/// both directions of the wire.
mod timestamp_key {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(*timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(iso: &str) -> DateTime<Utc> {
        parse_timestamp(iso).unwrap()
    }

    #[test]
    fn mood_create_serializes_to_wire_shape() {
        let event = Event {
            created_at: at("2021-01-01T00:00:00.000Z"),
            kind: EventKind::MoodCreate(Mood {
                mood: 7.0,
                description: Some("Calm".to_string()),
                updated_at: None,
            }),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "createdAt": "2021-01-01T00:00:00.000Z",
                "type": "v1/moods/create",
                "payload": {"mood": 7.0, "description": "Calm"}
            })
        );
    }

    #[test]
    fn delete_payload_is_a_bare_key() {
        let event = Event {
            created_at: at("2021-01-02T00:00:00.000Z"),
            kind: EventKind::MoodDelete("2021-01-01T00:00:00.000Z".to_string()),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "createdAt": "2021-01-02T00:00:00.000Z",
                "type": "v1/moods/delete",
                "payload": "2021-01-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn event_roundtrips_through_json() {
        let raw = r#"{
            "createdAt": "2021-06-15T09:30:00.000Z",
            "type": "v1/meditations/create",
            "payload": {"seconds": 600}
        }"#;

        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.id(), "2021-06-15T09:30:00.000Z");
        assert_eq!(event.kind, EventKind::MeditationCreate(Meditation { seconds: 600 }));

        let json = serde_json::to_string(&event).unwrap();
        let reparsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, event);
    }

    #[test]
    fn created_at_keeps_millisecond_form() {
        let event = Event {
            created_at: at("2021-01-01T00:00:00Z"),
            kind: EventKind::MeditationDelete("2020-12-31T23:00:00.000Z".to_string()),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"createdAt\":\"2021-01-01T00:00:00.000Z\""));
    }

    #[test]
    fn update_skips_absent_fields() {
        let update = MoodUpdate {
            id: "2021-01-01T00:00:00.000Z".to_string(),
            mood: Some(4.0),
            description: None,
        };

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "2021-01-01T00:00:00.000Z", "mood": 4.0})
        );
    }

    #[test]
    fn type_str_matches_serialized_tag() {
        let kinds = [
            EventKind::MoodCreate(Mood::default()),
            EventKind::MoodUpdate(MoodUpdate {
                id: String::new(),
                mood: None,
                description: None,
            }),
            EventKind::MoodDelete(String::new()),
            EventKind::MeditationCreate(Meditation { seconds: 0 }),
            EventKind::MeditationDelete(String::new()),
        ];

        for kind in kinds {
            let json = serde_json::to_value(&kind).unwrap();
            assert_eq!(json["type"], kind.type_str(), "tag mismatch for {kind:?}");
        }
    }

    #[test]
    fn key_time_rejects_garbage() {
        assert!(key_time("2021-01-01T00:00:00.000Z").is_some());
        assert!(key_time("not a timestamp").is_none());
    }
}
