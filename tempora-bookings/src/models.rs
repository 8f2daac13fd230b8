use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tempora_core::booking::EnrichedBooking;
use tempora_core::filters::FilterCriteria;
use tempora_core::status::{BookingStatus, StatusFilter};
use tempora_core::time;

use crate::lister::ListingError;

/// Request body for a booking listing call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsRequest {
    /// Offset into the merged result set. Defaults to 0.
    #[serde(default)]
    pub cursor: Option<i64>,
    /// Page size. Defaults to 10, capped at 100.
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub filters: BookingListFilters,
}

/// Raw filter payload as received on the wire. Date bounds arrive as strings
/// and are validated in [`to_criteria`](Self::to_criteria) before any query
/// runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingListFilters {
    pub status: Option<StatusFilter>,
    pub team_ids: Option<Vec<i64>>,
    pub user_ids: Option<Vec<i64>>,
    pub event_type_ids: Option<Vec<i64>>,
    pub attendee_email: Option<String>,
    pub attendee_name: Option<String>,
    pub after_start_date: Option<String>,
    pub before_end_date: Option<String>,
}

impl BookingListFilters {
    /// Validates the payload into typed criteria. Date bounds accept RFC 3339
    /// or a bare `YYYY-MM-DD` (read as midnight UTC).
    pub fn to_criteria(&self) -> Result<FilterCriteria, ListingError> {
        Ok(FilterCriteria {
            team_ids: self.team_ids.clone(),
            user_ids: self.user_ids.clone(),
            event_type_ids: self.event_type_ids.clone(),
            attendee_email: self.attendee_email.clone(),
            attendee_name: self.attendee_name.clone(),
            after_start_date: parse_bound(self.after_start_date.as_deref(), "afterStartDate")?,
            before_end_date: parse_bound(self.before_end_date.as_deref(), "beforeEndDate")?,
        })
    }
}

fn parse_bound(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, ListingError> {
    match raw {
        Some(value) => time::parse_date_bound(value)
            .map(Some)
            .map_err(|_| ListingError::InvalidRequest(format!("{field} is not a valid date: {value}"))),
        None => Ok(None),
    }
}

/// Aggregated view of one recurring series owned by the requester. Every
/// status has a bucket, empty or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringInfo {
    pub recurring_event_id: String,
    pub count: i64,
    pub first_date: Option<DateTime<Utc>>,
    pub bookings: BTreeMap<BookingStatus, Vec<DateTime<Utc>>>,
}

/// One page of the merged, enriched, privacy-filtered result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListPage {
    pub bookings: Vec<EnrichedBooking>,
    pub recurring_info: Vec<RecurringInfo>,
    /// Offset of the next page; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<i64>,
}
