use std::collections::HashSet;

use tempora_core::booking::BookingRef;

/// Concatenates the facet pages in their fixed facet order and keeps the
/// first occurrence of every booking uid.
///
/// The seen-set is allocated here and dropped on return. It must stay
/// call-local: a set shared across requests would let concurrent listings
/// swallow each other's rows.
pub fn merge_unique(pages: Vec<Vec<BookingRef>>) -> Vec<BookingRef> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();
    for page in pages {
        for booking in page {
            if seen.insert(booking.uid.clone()) {
                merged.push(booking);
            }
        }
    }
    merged
}
