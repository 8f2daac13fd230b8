use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::booking::{BookingRef, EnrichedBooking, RecurringOccurrence, RecurringSeriesSummary};
use crate::facet::VisibilityFacet;
use crate::filters::FilterFragment;
use crate::principal::Requester;
use crate::status::{SortOrder, StatusFilter};

/// Parameters shared by all five facet window queries of one listing call.
#[derive(Debug, Clone)]
pub struct FacetQuery<'a> {
    pub requester: &'a Requester,
    pub status: StatusFilter,
    /// Reference instant the status bucket is evaluated against. Fixed once
    /// per request so all facets see the same boundary.
    pub now: DateTime<Utc>,
    pub fragments: &'a [FilterFragment],
    /// Window size including the one-row lookahead.
    pub take: i64,
    pub skip: i64,
}

/// Repository trait for read-only access to the booking schema
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// One facet's window of booking refs, in the bucket's sort order.
    async fn facet_page(
        &self,
        facet: VisibilityFacet,
        query: &FacetQuery<'_>,
    ) -> Result<Vec<BookingRef>, Box<dyn std::error::Error + Send + Sync>>;

    /// Full projection for exactly `ids`, sorted by start time in `order`.
    /// Seat references in the projection are scoped to `requester_email`.
    async fn enriched_bookings(
        &self,
        ids: &[i64],
        requester_email: &str,
        order: SortOrder,
    ) -> Result<Vec<EnrichedBooking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Count and earliest start per recurring series owned by `owner_id`.
    async fn recurring_series_summary(
        &self,
        owner_id: i64,
    ) -> Result<Vec<RecurringSeriesSummary>, Box<dyn std::error::Error + Send + Sync>>;

    /// Every (series, status, start) tuple for series owned by `owner_id`.
    async fn recurring_series_occurrences(
        &self,
        owner_id: i64,
    ) -> Result<Vec<RecurringOccurrence>, Box<dyn std::error::Error + Send + Sync>>;
}
