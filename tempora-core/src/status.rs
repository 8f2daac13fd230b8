use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::CoreError;

/// Booking status in the lifecycle.
///
/// Variant order matters: recurring summaries key their per-status buckets by
/// this type, and the wire representation lists the buckets in declaration
/// order (`ACCEPTED` first, `AWAITING_HOST` last).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Accepted,
    Cancelled,
    Rejected,
    Pending,
    AwaitingHost,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Accepted,
        BookingStatus::Cancelled,
        BookingStatus::Rejected,
        BookingStatus::Pending,
        BookingStatus::AwaitingHost,
    ];

    /// Lowercase form used by the `booking_status` database enum.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            BookingStatus::Accepted => "accepted",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Pending => "pending",
            BookingStatus::AwaitingHost => "awaiting_host",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(BookingStatus::Accepted),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "rejected" => Ok(BookingStatus::Rejected),
            "pending" => Ok(BookingStatus::Pending),
            "awaiting_host" => Ok(BookingStatus::AwaitingHost),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Listing bucket requested by the caller. Absent means `Upcoming`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Upcoming,
    Recurring,
    Past,
    Cancelled,
    Unconfirmed,
}

impl StatusFilter {
    /// Direction booking windows are read in for this bucket. History buckets
    /// read newest-first, everything else soonest-first.
    pub fn sort_order(&self) -> SortOrder {
        match self {
            StatusFilter::Past | StatusFilter::Cancelled => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }
}

/// Sort direction on booking start time. The enrichment pass reapplies it
/// because facet concatenation order carries no meaning of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}
