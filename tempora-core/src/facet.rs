/// One independent reason a booking can be visible to the requester.
///
/// A booking may qualify under several facets at once; the merge step keeps
/// the first occurrence, so `ALL` fixes the concatenation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityFacet {
    /// Bookings the requester owns directly.
    Owner,
    /// Bookings where the requester appears as an attendee.
    Attendee,
    /// Bookings on event types of teams the requester administers as an
    /// admin or owner; plain membership does not qualify.
    TeamMember,
    /// Bookings owned by members of organizations the requester administers.
    OrganizationMember,
    /// Seated bookings where the requester holds a seat reference.
    SeatHolder,
}

impl VisibilityFacet {
    pub const ALL: [VisibilityFacet; 5] = [
        VisibilityFacet::Owner,
        VisibilityFacet::Attendee,
        VisibilityFacet::TeamMember,
        VisibilityFacet::OrganizationMember,
        VisibilityFacet::SeatHolder,
    ];
}
