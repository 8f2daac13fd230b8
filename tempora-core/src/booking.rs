use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tempora_shared::normalize::{EventTypeColor, RecurringEvent};
use tempora_shared::pii::Masked;
use uuid::Uuid;

use crate::status::BookingStatus;
use crate::CoreError;

/// Minimal projection used during the fan-out phase: just enough to merge
/// and deduplicate across facets before paying for enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRef {
    pub id: i64,
    pub uid: String,
}

/// Attendee entry on a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attendee {
    pub email: Masked<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub payment_option: Option<String>,
    pub amount: i32,
    pub currency: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
}

/// Owner of the booking as shown to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub name: Option<String>,
    pub email: Masked<String>,
}

/// One seat held on a seated booking. The enrichment query already scopes
/// these to the requester's own email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeatReferenceSummary {
    pub reference_uid: Uuid,
    pub attendee_email: Masked<String>,
}

/// Most recent routing decision recorded for the booking, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReasonSummary {
    pub created_at: DateTime<Utc>,
    pub reason_enum: String,
    pub reason_string: String,
}

/// How a team event type distributes its bookings over hosts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulingType {
    RoundRobin,
    Collective,
    Managed,
}

impl FromStr for SchedulingType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(SchedulingType::RoundRobin),
            "collective" => Ok(SchedulingType::Collective),
            "managed" => Ok(SchedulingType::Managed),
            other => Err(CoreError::UnknownSchedulingType(other.to_string())),
        }
    }
}

/// Event type details carried on each enriched booking. Recurrence template
/// and color metadata are normalized from their stored JSON blobs; malformed
/// blobs surface as absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub event_name: Option<String>,
    pub price: i32,
    pub currency: String,
    pub recurring_event: Option<RecurringEvent>,
    pub event_type_color: Option<EventTypeColor>,
    pub seats_show_attendees: Option<bool>,
    pub seats_show_availability_count: Option<bool>,
    pub scheduling_type: Option<SchedulingType>,
    pub length: i32,
    pub team: Option<TeamSummary>,
}

/// Fully enriched booking as returned to the caller, in final sort order.
/// Start and end render in the canonical textual form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBooking {
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub description: Option<String>,
    pub status: BookingStatus,
    pub paid: bool,
    pub payment: Vec<PaymentSummary>,
    pub responses: Option<Value>,
    pub recurring_event_id: Option<String>,
    pub location: Option<String>,
    pub is_recorded: bool,
    pub rescheduled: Option<bool>,
    pub attendees: Vec<Attendee>,
    pub event_type: Option<EventTypeSummary>,
    pub user: Option<UserSummary>,
    pub seats_references: Vec<SeatReferenceSummary>,
    pub assignment_reason: Option<AssignmentReasonSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routed_from_routing_form_response_id: Option<i64>,
    #[serde(with = "crate::time::canonical")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "crate::time::canonical")]
    pub end_time: DateTime<Utc>,
}

impl EnrichedBooking {
    /// Whether the event type explicitly allows showing the full attendee
    /// list on seated bookings. Unset means no.
    pub fn seats_show_attendees(&self) -> bool {
        self.event_type
            .as_ref()
            .and_then(|event_type| event_type.seats_show_attendees)
            .unwrap_or(false)
    }
}

/// Per-series aggregate: occurrence count and earliest start, scoped to
/// bookings the requester owns directly.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringSeriesSummary {
    pub recurring_event_id: String,
    pub count: i64,
    pub first_date: Option<DateTime<Utc>>,
}

/// One (series, status, start) tuple from the extended aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringOccurrence {
    pub recurring_event_id: String,
    pub status: BookingStatus,
    pub start_time: DateTime<Utc>,
}
