use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::str::FromStr;

use tempora_core::booking::{
    AssignmentReasonSummary, Attendee, BookingRef, EnrichedBooking, EventTypeSummary,
    PaymentSummary, RecurringOccurrence, RecurringSeriesSummary, SchedulingType,
    SeatReferenceSummary, TeamSummary, UserSummary,
};
use tempora_core::facet::VisibilityFacet;
use tempora_core::filters::FilterFragment;
use tempora_core::principal::Requester;
use tempora_core::repository::{BookingRepository, FacetQuery};
use tempora_core::status::{BookingStatus, SortOrder, StatusFilter};
use tempora_shared::normalize;
use tempora_shared::pii::Masked;

/// Postgres-backed read side of the booking schema. All SQL here is
/// assembled at runtime because facet, status bucket and filter fragments
/// combine dynamically per request.
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_sql(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    }
}

/// Ownership predicate for one visibility facet.
fn push_facet_predicate(
    builder: &mut QueryBuilder<'static, Postgres>,
    facet: VisibilityFacet,
    requester: &Requester,
) {
    match facet {
        VisibilityFacet::Owner => {
            builder.push("b.user_id = ").push_bind(requester.id);
        }
        VisibilityFacet::Attendee => {
            builder
                .push("EXISTS (SELECT 1 FROM attendees a WHERE a.booking_id = b.id AND a.email = ")
                .push_bind(requester.email.clone())
                .push(")");
        }
        VisibilityFacet::TeamMember => {
            builder
                .push(
                    "EXISTS (SELECT 1 FROM event_types et \
                     JOIN memberships m ON m.team_id = et.team_id \
                     WHERE et.id = b.event_type_id AND m.user_id = ",
                )
                .push_bind(requester.id)
                .push(" AND m.role IN ('ADMIN', 'OWNER'))");
        }
        VisibilityFacet::OrganizationMember => {
            builder
                .push(
                    "EXISTS (SELECT 1 FROM memberships owner_m \
                     JOIN teams org ON org.id = owner_m.team_id \
                     JOIN memberships requester_m ON requester_m.team_id = org.id \
                     WHERE owner_m.user_id = b.user_id \
                     AND org.is_organization \
                     AND requester_m.user_id = ",
                )
                .push_bind(requester.id)
                .push(" AND requester_m.role IN ('ADMIN', 'OWNER'))");
        }
        VisibilityFacet::SeatHolder => {
            builder
                .push(
                    "EXISTS (SELECT 1 FROM booking_seat_references sr \
                     JOIN attendees sa ON sa.id = sr.attendee_id \
                     WHERE sr.booking_id = b.id AND sa.email = ",
                )
                .push_bind(requester.email.clone())
                .push(")");
        }
    }
}

/// Predicate for the requested status bucket, evaluated against the
/// request-wide reference instant.
fn push_status_predicate(
    builder: &mut QueryBuilder<'static, Postgres>,
    status: StatusFilter,
    now: DateTime<Utc>,
) {
    match status {
        StatusFilter::Upcoming => {
            builder
                .push("(b.end_time >= ")
                .push_bind(now)
                .push(
                    " AND ((b.recurring_event_id IS NOT NULL AND b.status = 'accepted') \
                     OR (b.recurring_event_id IS NULL AND b.status NOT IN ('cancelled', 'rejected'))))",
                );
        }
        StatusFilter::Recurring => {
            builder
                .push("(b.end_time >= ")
                .push_bind(now)
                .push(
                    " AND b.recurring_event_id IS NOT NULL \
                     AND b.status NOT IN ('cancelled', 'rejected'))",
                );
        }
        StatusFilter::Past => {
            builder
                .push("(b.end_time <= ")
                .push_bind(now)
                .push(" AND b.status NOT IN ('cancelled', 'rejected'))");
        }
        StatusFilter::Cancelled => {
            builder.push("b.status IN ('cancelled', 'rejected')");
        }
        StatusFilter::Unconfirmed => {
            builder
                .push("(b.end_time >= ")
                .push_bind(now)
                .push(" AND b.status = 'pending')");
        }
    }
}

/// One compiled filter fragment, ANDed onto the facet and status predicates.
fn push_filter_fragment(builder: &mut QueryBuilder<'static, Postgres>, fragment: &FilterFragment) {
    match fragment {
        FilterFragment::TeamIds(ids) => {
            builder
                .push(
                    "EXISTS (SELECT 1 FROM event_types et \
                     WHERE et.id = b.event_type_id AND (et.team_id = ANY(",
                )
                .push_bind(ids.clone())
                .push(
                    ") OR EXISTS (SELECT 1 FROM event_types parent \
                     WHERE parent.id = et.parent_id AND parent.team_id = ANY(",
                )
                .push_bind(ids.clone())
                .push("))))");
        }
        FilterFragment::UserIds(ids) => {
            builder
                .push("(b.user_id = ANY(")
                .push_bind(ids.clone())
                .push(
                    ") OR EXISTS (SELECT 1 FROM event_type_hosts h \
                     WHERE h.event_type_id = b.event_type_id AND h.is_fixed AND h.user_id = ANY(",
                )
                .push_bind(ids.clone())
                .push(
                    ")) OR EXISTS (SELECT 1 FROM event_type_users etu \
                     WHERE etu.event_type_id = b.event_type_id AND etu.user_id = ANY(",
                )
                .push_bind(ids.clone())
                .push(")))");
        }
        FilterFragment::EventTypeIds(ids) => {
            builder
                .push("(b.event_type_id = ANY(")
                .push_bind(ids.clone())
                .push(
                    ") OR EXISTS (SELECT 1 FROM event_types et \
                     WHERE et.id = b.event_type_id AND et.parent_id = ANY(",
                )
                .push_bind(ids.clone())
                .push(")))");
        }
        FilterFragment::AttendeeEmail(email) => {
            builder
                .push("EXISTS (SELECT 1 FROM attendees a WHERE a.booking_id = b.id AND a.email = ")
                .push_bind(email.clone())
                .push(")");
        }
        FilterFragment::AttendeeName(name) => {
            builder
                .push("EXISTS (SELECT 1 FROM attendees a WHERE a.booking_id = b.id AND a.name = ")
                .push_bind(name.clone())
                .push(")");
        }
        FilterFragment::AfterStartDate(bound) => {
            builder.push("b.start_time >= ").push_bind(*bound);
        }
        FilterFragment::BeforeEndDate(bound) => {
            builder.push("b.end_time <= ").push_bind(*bound);
        }
    }
}

/// Window query for one facet: refs only, bucket sort order, lookahead
/// included in the limit.
fn build_facet_query(
    facet: VisibilityFacet,
    query: &FacetQuery<'_>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT b.id, b.uid FROM bookings b WHERE ");
    push_facet_predicate(&mut builder, facet, query.requester);
    builder.push(" AND ");
    push_status_predicate(&mut builder, query.status, query.now);
    for fragment in query.fragments {
        builder.push(" AND ");
        push_filter_fragment(&mut builder, fragment);
    }
    builder
        .push(" ORDER BY b.start_time ")
        .push(order_sql(query.status.sort_order()));
    builder.push(" LIMIT ").push_bind(query.take);
    builder.push(" OFFSET ").push_bind(query.skip);
    builder
}

/// Full projection for the deduplicated id list. Nested collections come
/// back as JSON aggregates so one row carries one booking; seat references
/// are scoped to the requester inside the query itself.
fn build_enrichment_query(
    ids: &[i64],
    requester_email: &str,
    order: SortOrder,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT \
             b.id, b.uid, b.title, b.description, b.status::text AS status, b.paid, \
             b.responses, b.recurring_event_id, b.location, b.is_recorded, b.rescheduled, \
             b.start_time, b.end_time, \
             et.id AS event_type_id, et.slug AS event_type_slug, et.title AS event_type_title, \
             et.event_name, et.price, et.currency, et.recurring_event, et.event_type_color, \
             et.seats_show_attendees, et.seats_show_availability_count, \
             et.scheduling_type::text AS scheduling_type, et.length, \
             team.id AS team_id, team.name AS team_name, team.slug AS team_slug, \
             owner.id AS owner_id, owner.name AS owner_name, owner.email AS owner_email, \
             rr.id AS routed_from_routing_form_response_id, \
             pay.items AS payments, att.items AS attendees, \
             seats.items AS seat_references, reason.item AS assignment_reason \
         FROM bookings b \
         LEFT JOIN event_types et ON et.id = b.event_type_id \
         LEFT JOIN teams team ON team.id = et.team_id \
         LEFT JOIN users owner ON owner.id = b.user_id \
         LEFT JOIN routing_form_responses rr ON rr.routed_to_booking_uid = b.uid \
         LEFT JOIN LATERAL ( \
             SELECT COALESCE(json_agg(json_build_object( \
                 'paymentOption', p.payment_option, \
                 'amount', p.amount, \
                 'currency', p.currency, \
                 'success', p.success \
             ) ORDER BY p.id), '[]'::json) AS items \
             FROM payments p WHERE p.booking_id = b.id \
         ) pay ON TRUE \
         LEFT JOIN LATERAL ( \
             SELECT COALESCE(json_agg(json_build_object( \
                 'email', a.email, \
                 'name', a.name \
             ) ORDER BY a.id), '[]'::json) AS items \
             FROM attendees a WHERE a.booking_id = b.id \
         ) att ON TRUE \
         LEFT JOIN LATERAL ( \
             SELECT COALESCE(json_agg(json_build_object( \
                 'referenceUid', sr.reference_uid, \
                 'attendeeEmail', sa.email \
             ) ORDER BY sr.id), '[]'::json) AS items \
             FROM booking_seat_references sr \
             JOIN attendees sa ON sa.id = sr.attendee_id \
             WHERE sr.booking_id = b.id AND sa.email = ",
    );
    builder.push_bind(requester_email.to_string());
    builder.push(
        " \
         ) seats ON TRUE \
         LEFT JOIN LATERAL ( \
             SELECT json_build_object( \
                 'createdAt', ar.created_at, \
                 'reasonEnum', ar.reason_enum, \
                 'reasonString', ar.reason_string \
             ) AS item \
             FROM booking_assignment_reasons ar \
             WHERE ar.booking_id = b.id \
             ORDER BY ar.created_at DESC \
             LIMIT 1 \
         ) reason ON TRUE \
         WHERE b.id = ANY(",
    );
    builder.push_bind(ids.to_vec());
    builder.push(") ORDER BY b.start_time ");
    builder.push(order_sql(order));
    builder
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRefRow {
    id: i64,
    uid: String,
}

#[derive(sqlx::FromRow)]
struct EnrichedRow {
    id: i64,
    uid: String,
    title: String,
    description: Option<String>,
    status: String,
    paid: bool,
    responses: Option<Value>,
    recurring_event_id: Option<String>,
    location: Option<String>,
    is_recorded: bool,
    rescheduled: Option<bool>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    event_type_id: Option<i64>,
    event_type_slug: Option<String>,
    event_type_title: Option<String>,
    event_name: Option<String>,
    price: Option<i32>,
    currency: Option<String>,
    recurring_event: Option<Value>,
    event_type_color: Option<Value>,
    seats_show_attendees: Option<bool>,
    seats_show_availability_count: Option<bool>,
    scheduling_type: Option<String>,
    length: Option<i32>,
    team_id: Option<i64>,
    team_name: Option<String>,
    team_slug: Option<String>,
    owner_id: Option<i64>,
    owner_name: Option<String>,
    owner_email: Option<String>,
    routed_from_routing_form_response_id: Option<i64>,
    payments: Option<Json<Vec<PaymentSummary>>>,
    attendees: Option<Json<Vec<Attendee>>>,
    seat_references: Option<Json<Vec<SeatReferenceSummary>>>,
    assignment_reason: Option<Json<AssignmentReasonSummary>>,
}

#[derive(sqlx::FromRow)]
struct RecurringSummaryRow {
    recurring_event_id: String,
    count: i64,
    first_date: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct RecurringOccurrenceRow {
    recurring_event_id: String,
    status: String,
    start_time: DateTime<Utc>,
}

impl EnrichedRow {
    fn into_booking(self) -> Result<EnrichedBooking, tempora_core::CoreError> {
        let status = BookingStatus::from_str(&self.status)?;

        let event_type = match self.event_type_id {
            Some(id) => {
                let scheduling_type = match self.scheduling_type.as_deref() {
                    Some(raw) => Some(SchedulingType::from_str(raw)?),
                    None => None,
                };
                Some(EventTypeSummary {
                    id,
                    slug: self.event_type_slug.unwrap_or_default(),
                    title: self.event_type_title.unwrap_or_default(),
                    event_name: self.event_name,
                    price: self.price.unwrap_or(0),
                    currency: self.currency.unwrap_or_else(|| "usd".to_string()),
                    recurring_event: normalize::parse_recurring_event(self.recurring_event.as_ref()),
                    event_type_color: normalize::parse_event_type_color(
                        self.event_type_color.as_ref(),
                    ),
                    seats_show_attendees: self.seats_show_attendees,
                    seats_show_availability_count: self.seats_show_availability_count,
                    scheduling_type,
                    length: self.length.unwrap_or(0),
                    team: match (self.team_id, self.team_name) {
                        (Some(team_id), Some(team_name)) => Some(TeamSummary {
                            id: team_id,
                            name: team_name,
                            slug: self.team_slug,
                        }),
                        _ => None,
                    },
                })
            }
            None => None,
        };

        let user = self.owner_id.map(|owner_id| UserSummary {
            id: owner_id,
            name: self.owner_name,
            email: Masked(self.owner_email.unwrap_or_default()),
        });

        Ok(EnrichedBooking {
            id: self.id,
            uid: self.uid,
            title: self.title,
            description: self.description,
            status,
            paid: self.paid,
            payment: self.payments.map(|json| json.0).unwrap_or_default(),
            responses: self.responses,
            recurring_event_id: self.recurring_event_id,
            location: self.location,
            is_recorded: self.is_recorded,
            rescheduled: self.rescheduled,
            attendees: self.attendees.map(|json| json.0).unwrap_or_default(),
            event_type,
            user,
            seats_references: self.seat_references.map(|json| json.0).unwrap_or_default(),
            assignment_reason: self.assignment_reason.map(|json| json.0),
            routed_from_routing_form_response_id: self.routed_from_routing_form_response_id,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn facet_page(
        &self,
        facet: VisibilityFacet,
        query: &FacetQuery<'_>,
    ) -> Result<Vec<BookingRef>, Box<dyn std::error::Error + Send + Sync>> {
        let mut builder = build_facet_query(facet, query);
        let rows: Vec<BookingRefRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| BookingRef {
                id: row.id,
                uid: row.uid,
            })
            .collect())
    }

    async fn enriched_bookings(
        &self,
        ids: &[i64],
        requester_email: &str,
        order: SortOrder,
    ) -> Result<Vec<EnrichedBooking>, Box<dyn std::error::Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = build_enrichment_query(ids, requester_email, order);
        let rows: Vec<EnrichedRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let bookings = rows
            .into_iter()
            .map(EnrichedRow::into_booking)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bookings)
    }

    async fn recurring_series_summary(
        &self,
        owner_id: i64,
    ) -> Result<Vec<RecurringSeriesSummary>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<RecurringSummaryRow> = sqlx::query_as(
            "SELECT b.recurring_event_id, COUNT(*) AS count, MIN(b.start_time) AS first_date \
             FROM bookings b \
             WHERE b.user_id = $1 AND b.recurring_event_id IS NOT NULL \
             GROUP BY b.recurring_event_id \
             ORDER BY b.recurring_event_id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RecurringSeriesSummary {
                recurring_event_id: row.recurring_event_id,
                count: row.count,
                first_date: row.first_date,
            })
            .collect())
    }

    async fn recurring_series_occurrences(
        &self,
        owner_id: i64,
    ) -> Result<Vec<RecurringOccurrence>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<RecurringOccurrenceRow> = sqlx::query_as(
            "SELECT b.recurring_event_id, b.status::text AS status, b.start_time \
             FROM bookings b \
             WHERE b.user_id = $1 AND b.recurring_event_id IS NOT NULL \
             GROUP BY b.recurring_event_id, b.status, b.start_time \
             ORDER BY b.start_time ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let occurrences = rows
            .into_iter()
            .map(|row| {
                Ok(RecurringOccurrence {
                    recurring_event_id: row.recurring_event_id,
                    status: BookingStatus::from_str(&row.status)?,
                    start_time: row.start_time,
                })
            })
            .collect::<Result<Vec<_>, tempora_core::CoreError>>()?;
        Ok(occurrences)
    }
}
