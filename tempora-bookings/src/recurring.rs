use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tempora_core::booking::{RecurringOccurrence, RecurringSeriesSummary};
use tempora_core::status::BookingStatus;

use crate::models::RecurringInfo;

/// Folds the two owner-scoped aggregates into one structure per series.
///
/// Every status bucket is created up front, so consumers always find all
/// five keys and read an empty sequence instead of a missing one. Occurrence
/// timestamps keep the order the extended aggregate returned them in.
pub fn group_by_series(
    summaries: &[RecurringSeriesSummary],
    occurrences: &[RecurringOccurrence],
) -> Vec<RecurringInfo> {
    summaries
        .iter()
        .map(|summary| {
            let mut buckets: BTreeMap<BookingStatus, Vec<DateTime<Utc>>> = BookingStatus::ALL
                .into_iter()
                .map(|status| (status, Vec::new()))
                .collect();
            for occurrence in occurrences
                .iter()
                .filter(|occurrence| occurrence.recurring_event_id == summary.recurring_event_id)
            {
                buckets
                    .entry(occurrence.status)
                    .or_default()
                    .push(occurrence.start_time);
            }
            RecurringInfo {
                recurring_event_id: summary.recurring_event_id.clone(),
                count: summary.count,
                first_date: summary.first_date,
                bookings: buckets,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, 9, 0, 0).unwrap()
    }

    fn summary(series: &str, count: i64, first_day: u32) -> RecurringSeriesSummary {
        RecurringSeriesSummary {
            recurring_event_id: series.to_string(),
            count,
            first_date: Some(at(first_day)),
        }
    }

    fn occurrence(series: &str, status: BookingStatus, day: u32) -> RecurringOccurrence {
        RecurringOccurrence {
            recurring_event_id: series.to_string(),
            status,
            start_time: at(day),
        }
    }

    #[test]
    fn test_every_status_bucket_is_present() {
        let grouped = group_by_series(&[summary("weekly-sync", 1, 7)], &[]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].bookings.len(), 5);
        for bucket in grouped[0].bookings.values() {
            assert!(bucket.is_empty());
        }
    }

    #[test]
    fn test_occurrences_land_in_their_status_bucket() {
        let occurrences = vec![
            occurrence("weekly-sync", BookingStatus::Accepted, 7),
            occurrence("weekly-sync", BookingStatus::Accepted, 14),
            occurrence("weekly-sync", BookingStatus::Cancelled, 21),
            occurrence("standup", BookingStatus::Pending, 8),
        ];
        let grouped = group_by_series(
            &[summary("weekly-sync", 3, 7), summary("standup", 1, 8)],
            &occurrences,
        );

        let weekly = &grouped[0];
        assert_eq!(weekly.bookings[&BookingStatus::Accepted], vec![at(7), at(14)]);
        assert_eq!(weekly.bookings[&BookingStatus::Cancelled], vec![at(21)]);
        assert!(weekly.bookings[&BookingStatus::Pending].is_empty());

        let standup = &grouped[1];
        assert_eq!(standup.bookings[&BookingStatus::Pending], vec![at(8)]);
        assert!(standup.bookings[&BookingStatus::Accepted].is_empty());
    }

    #[test]
    fn test_total_occurrences_match_across_buckets() {
        let occurrences = vec![
            occurrence("s", BookingStatus::Accepted, 1),
            occurrence("s", BookingStatus::Rejected, 2),
            occurrence("s", BookingStatus::AwaitingHost, 3),
        ];
        let grouped = group_by_series(&[summary("s", 3, 1)], &occurrences);
        let total: usize = grouped[0].bookings.values().map(Vec::len).sum();
        assert_eq!(total, occurrences.len());
    }

    #[test]
    fn test_buckets_serialize_in_declaration_order() {
        let grouped = group_by_series(&[summary("s", 0, 1)], &[]);
        let json = serde_json::to_string(&grouped[0]).unwrap();
        let accepted = json.find("ACCEPTED").unwrap();
        let cancelled = json.find("CANCELLED").unwrap();
        let rejected = json.find("REJECTED").unwrap();
        let pending = json.find("PENDING").unwrap();
        let awaiting = json.find("AWAITING_HOST").unwrap();
        assert!(accepted < cancelled && cancelled < rejected);
        assert!(rejected < pending && pending < awaiting);
    }
}
