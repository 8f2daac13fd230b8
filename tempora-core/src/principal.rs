use serde::{Deserialize, Serialize};

/// The session principal a listing runs on behalf of. The id drives the
/// owner, team and organization facets; the email drives the attendee and
/// seat-holder facets plus the seat privacy rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: i64,
    pub email: String,
}
