use std::sync::Arc;

use chrono::Utc;
use futures_util::future;
use tracing::debug;

use tempora_core::booking::EnrichedBooking;
use tempora_core::facet::VisibilityFacet;
use tempora_core::principal::Requester;
use tempora_core::repository::{BookingRepository, FacetQuery};

use crate::dedup;
use crate::models::{BookingListPage, ListBookingsRequest};
use crate::pagination::Pagination;
use crate::recurring;

/// Read-only listing engine. Resolves every booking the requester may see
/// across the five visibility facets, merges and enriches them, and folds
/// the requester's recurring series into per-status summaries.
pub struct BookingLister {
    repo: Arc<dyn BookingRepository>,
}

impl BookingLister {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        requester: &Requester,
        request: &ListBookingsRequest,
    ) -> Result<BookingListPage, ListingError> {
        // 1. Validate before anything touches the store.
        let page = Pagination::from_request(request.cursor, request.limit)?;
        let status = request.filters.status.unwrap_or_default();
        let criteria = request.filters.to_criteria()?;
        let fragments = criteria.compile();

        let query = FacetQuery {
            requester,
            status,
            now: Utc::now(),
            fragments: &fragments,
            take: page.take_with_lookahead(),
            skip: page.offset(),
        };

        // 2. Fan out: five facet windows plus the two recurring aggregates,
        //    all in flight at once. Any failure fails the whole request.
        let facets = VisibilityFacet::ALL;
        let facet_pages = facets
            .iter()
            .map(|facet| self.repo.facet_page(*facet, &query));
        let (pages, series, occurrences) = tokio::try_join!(
            future::try_join_all(facet_pages),
            self.repo.recurring_series_summary(requester.id),
            self.repo.recurring_series_occurrences(requester.id),
        )
        .map_err(ListingError::DataSource)?;

        // 3. Merge the facet pages, first occurrence of each uid wins.
        let fetched: usize = pages.iter().map(Vec::len).sum();
        let merged = dedup::merge_unique(pages);
        debug!(
            "merged {} facet rows into {} unique bookings for user {}",
            fetched,
            merged.len(),
            requester.id
        );

        // 4. Enrich the deduplicated ids in one query, back in sort order.
        let ids: Vec<i64> = merged.iter().map(|booking| booking.id).collect();
        let mut bookings = self
            .repo
            .enriched_bookings(&ids, &requester.email, status.sort_order())
            .await
            .map_err(ListingError::DataSource)?;

        // 5. Redact attendee lists on seated bookings that hide attendees.
        apply_seat_privacy(&mut bookings, &requester.email);

        // 6. The lookahead row decides the next cursor, then gets cut.
        let next_cursor = page.next_cursor(bookings.len());
        bookings.truncate(page.limit());

        Ok(BookingListPage {
            bookings,
            recurring_info: recurring::group_by_series(&series, &occurrences),
            next_cursor,
        })
    }
}

/// On bookings with seat references whose event type does not show attendees,
/// only the requester's own attendee entry survives. Runs after enrichment:
/// the unfiltered list still participates in facet matching.
fn apply_seat_privacy(bookings: &mut [EnrichedBooking], requester_email: &str) {
    for booking in bookings.iter_mut() {
        if booking.seats_references.is_empty() || booking.seats_show_attendees() {
            continue;
        }
        booking
            .attendees
            .retain(|attendee| attendee.email.inner() == requester_email);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Data source failure: {0}")]
    DataSource(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempora_core::booking::{
        Attendee, BookingRef, EventTypeSummary, RecurringOccurrence, RecurringSeriesSummary,
        SeatReferenceSummary,
    };
    use tempora_core::status::{BookingStatus, SortOrder, StatusFilter};
    use tempora_shared::pii::Masked;
    use uuid::Uuid;

    use crate::models::BookingListFilters;

    const REQUESTER_EMAIL: &str = "host@example.com";

    fn requester() -> Requester {
        Requester {
            id: 42,
            email: REQUESTER_EMAIL.to_string(),
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, 10, 0, 0).unwrap()
    }

    fn booking_ref(id: i64) -> BookingRef {
        BookingRef {
            id,
            uid: format!("uid-{id}"),
        }
    }

    fn attendee(email: &str) -> Attendee {
        Attendee {
            email: Masked(email.to_string()),
            name: email.split('@').next().unwrap().to_string(),
        }
    }

    fn event_type(seats_show_attendees: Option<bool>) -> EventTypeSummary {
        EventTypeSummary {
            id: 7,
            slug: "thirty-minutes".to_string(),
            title: "30 minute call".to_string(),
            event_name: None,
            price: 0,
            currency: "usd".to_string(),
            recurring_event: None,
            event_type_color: None,
            seats_show_attendees,
            seats_show_availability_count: None,
            scheduling_type: None,
            length: 30,
            team: None,
        }
    }

    fn seat_for(email: &str) -> SeatReferenceSummary {
        SeatReferenceSummary {
            reference_uid: Uuid::new_v4(),
            attendee_email: Masked(email.to_string()),
        }
    }

    fn enriched(id: i64, day: u32) -> EnrichedBooking {
        EnrichedBooking {
            id,
            uid: format!("uid-{id}"),
            title: format!("Booking {id}"),
            description: None,
            status: BookingStatus::Accepted,
            paid: false,
            payment: vec![],
            responses: None,
            recurring_event_id: None,
            location: None,
            is_recorded: false,
            rescheduled: None,
            attendees: vec![attendee(REQUESTER_EMAIL)],
            event_type: Some(event_type(None)),
            user: None,
            seats_references: vec![],
            assignment_reason: None,
            routed_from_routing_form_response_id: None,
            start_time: at(day),
            end_time: at(day),
        }
    }

    #[derive(Default)]
    struct MockRepository {
        pages: HashMap<VisibilityFacet, Vec<BookingRef>>,
        enriched: Vec<EnrichedBooking>,
        series: Vec<RecurringSeriesSummary>,
        occurrences: Vec<RecurringOccurrence>,
        fail_facet: Option<VisibilityFacet>,
        fail_recurring: bool,
        facet_calls: AtomicUsize,
        enrichment_calls: AtomicUsize,
        seen_status: Mutex<Option<StatusFilter>>,
        seen_fragments: AtomicUsize,
    }

    #[async_trait]
    impl BookingRepository for MockRepository {
        async fn facet_page(
            &self,
            facet: VisibilityFacet,
            query: &FacetQuery<'_>,
        ) -> Result<Vec<BookingRef>, Box<dyn std::error::Error + Send + Sync>> {
            self.facet_calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_status.lock().unwrap() = Some(query.status);
            self.seen_fragments
                .store(query.fragments.len(), Ordering::SeqCst);
            if self.fail_facet == Some(facet) {
                return Err("facet query failed".into());
            }
            let page = self.pages.get(&facet).cloned().unwrap_or_default();
            Ok(page
                .into_iter()
                .skip(query.skip as usize)
                .take(query.take as usize)
                .collect())
        }

        async fn enriched_bookings(
            &self,
            ids: &[i64],
            _requester_email: &str,
            order: SortOrder,
        ) -> Result<Vec<EnrichedBooking>, Box<dyn std::error::Error + Send + Sync>> {
            self.enrichment_calls.fetch_add(1, Ordering::SeqCst);
            let mut rows: Vec<EnrichedBooking> = self
                .enriched
                .iter()
                .filter(|booking| ids.contains(&booking.id))
                .cloned()
                .collect();
            rows.sort_by_key(|booking| booking.start_time);
            if order == SortOrder::Descending {
                rows.reverse();
            }
            Ok(rows)
        }

        async fn recurring_series_summary(
            &self,
            _owner_id: i64,
        ) -> Result<Vec<RecurringSeriesSummary>, Box<dyn std::error::Error + Send + Sync>> {
            if self.fail_recurring {
                return Err("recurring summary failed".into());
            }
            Ok(self.series.clone())
        }

        async fn recurring_series_occurrences(
            &self,
            _owner_id: i64,
        ) -> Result<Vec<RecurringOccurrence>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.occurrences.clone())
        }
    }

    fn lister(repo: MockRepository) -> (BookingLister, Arc<MockRepository>) {
        let repo = Arc::new(repo);
        (BookingLister::new(repo.clone()), repo)
    }

    fn request() -> ListBookingsRequest {
        ListBookingsRequest::default()
    }

    #[tokio::test]
    async fn test_booking_in_several_facets_appears_once() {
        // Requester owns bookings 1 and 2 and also attends booking 1.
        let mut pages = HashMap::new();
        pages.insert(
            VisibilityFacet::Owner,
            vec![booking_ref(1), booking_ref(2)],
        );
        pages.insert(VisibilityFacet::Attendee, vec![booking_ref(1)]);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: vec![enriched(1, 1), enriched(2, 2)],
            ..Default::default()
        });

        let page = lister
            .list(
                &requester(),
                &ListBookingsRequest {
                    filters: BookingListFilters {
                        status: Some(StatusFilter::Upcoming),
                        attendee_email: Some(REQUESTER_EMAIL.to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.bookings.len(), 2);
        let uids: Vec<&str> = page.bookings.iter().map(|b| b.uid.as_str()).collect();
        assert_eq!(uids, vec!["uid-1", "uid-2"]);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_lookahead_row_produces_next_cursor() {
        let refs: Vec<BookingRef> = (1..=11).map(booking_ref).collect();
        let enriched_rows: Vec<EnrichedBooking> =
            (1..=11).map(|id| enriched(id, id as u32)).collect();
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, refs);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: enriched_rows,
            ..Default::default()
        });

        let page = lister.list(&requester(), &request()).await.unwrap();

        assert_eq!(page.bookings.len(), 10);
        assert_eq!(page.next_cursor, Some(10));
    }

    #[tokio::test]
    async fn test_exact_limit_leaves_no_next_cursor() {
        let refs: Vec<BookingRef> = (1..=10).map(booking_ref).collect();
        let enriched_rows: Vec<EnrichedBooking> =
            (1..=10).map(|id| enriched(id, id as u32)).collect();
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, refs);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: enriched_rows,
            ..Default::default()
        });

        let page = lister.list(&requester(), &request()).await.unwrap();

        assert_eq!(page.bookings.len(), 10);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_cursor_advances_by_limit() {
        let refs: Vec<BookingRef> = (1..=30).map(booking_ref).collect();
        let enriched_rows: Vec<EnrichedBooking> =
            (1..=30).map(|id| enriched(id, id as u32)).collect();
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, refs);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: enriched_rows,
            ..Default::default()
        });

        let page = lister
            .list(
                &requester(),
                &ListBookingsRequest {
                    cursor: Some(10),
                    limit: Some(10),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.bookings.len(), 10);
        assert_eq!(page.bookings[0].id, 11);
        assert_eq!(page.next_cursor, Some(20));
    }

    #[tokio::test]
    async fn test_seated_booking_hides_other_attendees() {
        let mut seated = enriched(1, 1);
        seated.attendees = vec![
            attendee(REQUESTER_EMAIL),
            attendee("guest@example.com"),
            attendee("plus-one@example.com"),
        ];
        seated.seats_references = vec![seat_for(REQUESTER_EMAIL)];
        seated.event_type = Some(event_type(None));
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, vec![booking_ref(1)]);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: vec![seated],
            ..Default::default()
        });

        let page = lister.list(&requester(), &request()).await.unwrap();

        let attendees = &page.bookings[0].attendees;
        assert_eq!(attendees.len(), 1);
        assert_eq!(attendees[0].email.inner(), REQUESTER_EMAIL);
    }

    #[tokio::test]
    async fn test_seated_booking_without_event_type_still_hides_attendees() {
        let mut seated = enriched(1, 1);
        seated.attendees = vec![attendee(REQUESTER_EMAIL), attendee("guest@example.com")];
        seated.seats_references = vec![seat_for(REQUESTER_EMAIL)];
        seated.event_type = None;
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, vec![booking_ref(1)]);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: vec![seated],
            ..Default::default()
        });

        let page = lister.list(&requester(), &request()).await.unwrap();

        let attendees = &page.bookings[0].attendees;
        assert_eq!(attendees.len(), 1);
        assert_eq!(attendees[0].email.inner(), REQUESTER_EMAIL);
    }

    #[tokio::test]
    async fn test_seated_booking_showing_attendees_keeps_them_all() {
        let mut seated = enriched(1, 1);
        seated.attendees = vec![attendee(REQUESTER_EMAIL), attendee("guest@example.com")];
        seated.seats_references = vec![seat_for(REQUESTER_EMAIL)];
        seated.event_type = Some(event_type(Some(true)));
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, vec![booking_ref(1)]);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: vec![seated],
            ..Default::default()
        });

        let page = lister.list(&requester(), &request()).await.unwrap();

        assert_eq!(page.bookings[0].attendees.len(), 2);
    }

    #[tokio::test]
    async fn test_unseated_booking_keeps_attendees() {
        let mut open = enriched(1, 1);
        open.attendees = vec![attendee(REQUESTER_EMAIL), attendee("guest@example.com")];
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, vec![booking_ref(1)]);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: vec![open],
            ..Default::default()
        });

        let page = lister.list(&requester(), &request()).await.unwrap();

        assert_eq!(page.bookings[0].attendees.len(), 2);
    }

    #[tokio::test]
    async fn test_facet_failure_fails_the_whole_request() {
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, vec![booking_ref(1)]);
        let (lister, repo) = lister(MockRepository {
            pages,
            enriched: vec![enriched(1, 1)],
            fail_facet: Some(VisibilityFacet::OrganizationMember),
            ..Default::default()
        });

        let err = lister.list(&requester(), &request()).await.unwrap_err();

        assert!(matches!(err, ListingError::DataSource(_)));
        assert_eq!(repo.enrichment_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recurring_failure_fails_the_whole_request() {
        let (lister, repo) = lister(MockRepository {
            fail_recurring: true,
            ..Default::default()
        });

        let err = lister.list(&requester(), &request()).await.unwrap_err();

        assert!(matches!(err, ListingError::DataSource(_)));
        assert_eq!(repo.enrichment_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_limit_is_rejected_before_any_query() {
        let (lister, repo) = lister(MockRepository::default());

        let err = lister
            .list(
                &requester(),
                &ListBookingsRequest {
                    limit: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ListingError::InvalidRequest(_)));
        assert_eq!(repo.facet_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_date_is_rejected_before_any_query() {
        let (lister, repo) = lister(MockRepository::default());

        let err = lister
            .list(
                &requester(),
                &ListBookingsRequest {
                    filters: BookingListFilters {
                        before_end_date: Some("yesterday".to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ListingError::InvalidRequest(_)));
        assert_eq!(repo.facet_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_status_and_filters_reach_every_facet_query() {
        let (lister, repo) = lister(MockRepository::default());

        lister
            .list(
                &requester(),
                &ListBookingsRequest {
                    filters: BookingListFilters {
                        status: Some(StatusFilter::Cancelled),
                        team_ids: Some(vec![4, 9]),
                        attendee_email: Some("ada@example.com".to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(repo.facet_calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            *repo.seen_status.lock().unwrap(),
            Some(StatusFilter::Cancelled)
        );
        assert_eq!(repo.seen_fragments.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_recurring_series_are_grouped_into_buckets() {
        let (lister, _) = lister(MockRepository {
            series: vec![RecurringSeriesSummary {
                recurring_event_id: "series-1".to_string(),
                count: 2,
                first_date: Some(at(1)),
            }],
            occurrences: vec![
                RecurringOccurrence {
                    recurring_event_id: "series-1".to_string(),
                    status: BookingStatus::Accepted,
                    start_time: at(1),
                },
                RecurringOccurrence {
                    recurring_event_id: "series-1".to_string(),
                    status: BookingStatus::Accepted,
                    start_time: at(8),
                },
            ],
            ..Default::default()
        });

        let page = lister.list(&requester(), &request()).await.unwrap();

        assert_eq!(page.recurring_info.len(), 1);
        let info = &page.recurring_info[0];
        assert_eq!(info.count, 2);
        assert_eq!(info.bookings[&BookingStatus::Accepted], vec![at(1), at(8)]);
        assert_eq!(info.bookings.len(), 5);
    }

    #[tokio::test]
    async fn test_past_bucket_lists_newest_first() {
        let refs: Vec<BookingRef> = (1..=3).map(booking_ref).collect();
        let enriched_rows: Vec<EnrichedBooking> =
            (1..=3).map(|id| enriched(id, id as u32)).collect();
        let mut pages = HashMap::new();
        pages.insert(VisibilityFacet::Owner, refs);
        let (lister, _) = lister(MockRepository {
            pages,
            enriched: enriched_rows,
            ..Default::default()
        });

        let page = lister
            .list(
                &requester(),
                &ListBookingsRequest {
                    filters: BookingListFilters {
                        status: Some(StatusFilter::Past),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let ids: Vec<i64> = page.bookings.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
