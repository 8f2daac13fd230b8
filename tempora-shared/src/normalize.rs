//! Normalizers for the schemaless JSON blobs stored on event types.
//!
//! The stored payloads come from older writers and migrations, so the parsers
//! here are tolerant: anything malformed normalizes to `None` instead of
//! failing the whole read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recurrence rule template attached to an event type, RRULE-shaped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringEvent {
    /// RRULE frequency ordinal (0 = yearly .. 6 = secondly).
    pub freq: u8,
    pub count: i32,
    pub interval: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtstart: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tzid: Option<String>,
}

/// Per-theme display colors configured on an event type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeColor {
    pub light_event_type_color: String,
    pub dark_event_type_color: String,
}

/// Reads a stored recurrence blob. Empty objects mean "not recurring".
pub fn parse_recurring_event(raw: Option<&Value>) -> Option<RecurringEvent> {
    let value = raw?;
    match value {
        Value::Null => None,
        Value::Object(fields) if fields.is_empty() => None,
        other => serde_json::from_value(other.clone()).ok(),
    }
}

/// Reads a stored event-type color blob.
pub fn parse_event_type_color(raw: Option<&Value>) -> Option<EventTypeColor> {
    let value = raw?;
    match value {
        Value::Null => None,
        other => serde_json::from_value(other.clone()).ok(),
    }
}
