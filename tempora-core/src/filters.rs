use chrono::{DateTime, Utc};

/// Caller-supplied listing filters, already validated. All fields are
/// optional; each present field compiles to exactly one predicate fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub team_ids: Option<Vec<i64>>,
    pub user_ids: Option<Vec<i64>>,
    pub event_type_ids: Option<Vec<i64>>,
    pub attendee_email: Option<String>,
    pub attendee_name: Option<String>,
    pub after_start_date: Option<DateTime<Utc>>,
    pub before_end_date: Option<DateTime<Utc>>,
}

/// One compiled predicate over the booking schema. Fragments are combined
/// with AND; an absent or empty filter contributes no fragment at all rather
/// than a permissive wildcard.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterFragment {
    /// Event type belongs to one of the teams, directly or via its parent
    /// event type.
    TeamIds(Vec<i64>),
    /// Event type has a fixed host in the set, or the booking owner is in the
    /// set, or the event type's assignable user pool intersects the set.
    UserIds(Vec<i64>),
    /// Event type id, or its parent's id, is in the set.
    EventTypeIds(Vec<i64>),
    /// At least one attendee record carries exactly this email.
    AttendeeEmail(String),
    /// At least one attendee record carries exactly this name.
    AttendeeName(String),
    /// Booking start is at or after the bound.
    AfterStartDate(DateTime<Utc>),
    /// Booking end is at or before the bound.
    BeforeEndDate(DateTime<Utc>),
}

impl FilterCriteria {
    /// Compiles the criteria into predicate fragments, in a stable order.
    /// Attendee strings are trimmed here; blank strings and empty id sets
    /// produce nothing.
    pub fn compile(&self) -> Vec<FilterFragment> {
        let mut fragments = Vec::new();

        if let Some(ids) = non_empty(&self.team_ids) {
            fragments.push(FilterFragment::TeamIds(ids));
        }
        if let Some(ids) = non_empty(&self.user_ids) {
            fragments.push(FilterFragment::UserIds(ids));
        }
        if let Some(ids) = non_empty(&self.event_type_ids) {
            fragments.push(FilterFragment::EventTypeIds(ids));
        }
        if let Some(email) = non_blank(&self.attendee_email) {
            fragments.push(FilterFragment::AttendeeEmail(email));
        }
        if let Some(name) = non_blank(&self.attendee_name) {
            fragments.push(FilterFragment::AttendeeName(name));
        }
        if let Some(bound) = self.after_start_date {
            fragments.push(FilterFragment::AfterStartDate(bound));
        }
        if let Some(bound) = self.before_end_date {
            fragments.push(FilterFragment::BeforeEndDate(bound));
        }

        fragments
    }
}

fn non_empty(ids: &Option<Vec<i64>>) -> Option<Vec<i64>> {
    ids.as_ref().filter(|ids| !ids.is_empty()).cloned()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}
