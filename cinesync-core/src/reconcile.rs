//! Reconciliation between extracted tickets and existing calendar entries.
//!
//! The calendar is the only durable record: a ticket is registered exactly
//! when some entry already represents it. No index structure; the ticket
//! and entry counts here are single digits.

use chrono::NaiveDateTime;

use crate::entry::CalendarEntry;
use crate::error::{CineSyncError, CineSyncResult};
use crate::ticket::Ticket;

/// Return the tickets that no existing entry represents, in input order.
///
/// An entry represents a ticket when its title contains the ticket title as
/// a substring. Substring matching tolerates decorated entry titles, at the
/// cost of treating a ticket whose title is contained in another entry's as
/// already covered.
pub fn missing_tickets(tickets: &[Ticket], entries: &[CalendarEntry]) -> Vec<Ticket> {
    tickets
        .iter()
        .filter(|ticket| {
            !entries
                .iter()
                .any(|entry| entry.title.contains(&ticket.title))
        })
        .cloned()
        .collect()
}

/// Tightest time window covering every ticket: `[min(start), max(end)]`.
///
/// An empty ticket set has no window; callers must handle that before
/// asking, so this fails with a typed error instead of producing garbage
/// bounds.
pub fn coverage_window(tickets: &[Ticket]) -> CineSyncResult<(NaiveDateTime, NaiveDateTime)> {
    let start = tickets
        .iter()
        .map(|t| t.start_time)
        .min()
        .ok_or(CineSyncError::NoTickets)?;
    let end = tickets
        .iter()
        .map(|t| t.end_time)
        .max()
        .ok_or(CineSyncError::NoTickets)?;

    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ticket(title: &str, start: (u32, u32), end: (u32, u32)) -> Ticket {
        let date = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        Ticket {
            ticket_number: "240329001".to_string(),
            title: title.to_string(),
            start_time: date.and_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: date.and_hms_opt(end.0, end.1, 0).unwrap(),
            theater: "シネマ・ワン b studio".to_string(),
            seat: "C-5".to_string(),
        }
    }

    fn entry(title: &str) -> CalendarEntry {
        let date = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        CalendarEntry {
            id: "evt-1".to_string(),
            title: title.to_string(),
            start_time: date.and_hms_opt(12, 0, 0).unwrap(),
            end_time: date.and_hms_opt(14, 0, 0).unwrap(),
            description: None,
            location: None,
        }
    }

    #[test]
    fn test_decorated_entry_title_covers_ticket() {
        let tickets = vec![ticket("Movie A", (12, 0), (14, 0))];
        let entries = vec![entry("Movie A Showing")];

        assert!(missing_tickets(&tickets, &entries).is_empty());
    }

    #[test]
    fn test_unrelated_entries_do_not_cover_ticket() {
        let tickets = vec![ticket("Movie A", (12, 0), (14, 0))];
        let entries = vec![entry("Dentist"), entry("Movie B Showing")];

        let missing = missing_tickets(&tickets, &entries);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].title, "Movie A");
    }

    #[test]
    fn test_result_is_subset_in_input_order() {
        let tickets = vec![
            ticket("Movie A", (10, 0), (12, 0)),
            ticket("Movie B", (13, 0), (15, 0)),
            ticket("Movie C", (16, 0), (18, 0)),
        ];
        let entries = vec![entry("Movie B Showing")];

        let missing = missing_tickets(&tickets, &entries);
        let titles: Vec<&str> = missing.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Movie A", "Movie C"]);
    }

    #[test]
    fn test_no_entries_means_every_ticket_is_missing() {
        let tickets = vec![ticket("Movie A", (12, 0), (14, 0))];

        assert_eq!(missing_tickets(&tickets, &[]).len(), 1);
    }

    #[test]
    fn test_coverage_window_spans_min_start_to_max_end() {
        let tickets = vec![
            ticket("Movie A", (10, 0), (12, 0)),
            ticket("Movie B", (11, 30), (13, 15)),
        ];

        let (start, end) = coverage_window(&tickets).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        assert_eq!(start, date.and_hms_opt(10, 0, 0).unwrap());
        assert_eq!(end, date.and_hms_opt(13, 15, 0).unwrap());
    }

    #[test]
    fn test_coverage_window_rejects_empty_ticket_set() {
        assert!(matches!(
            coverage_window(&[]),
            Err(CineSyncError::NoTickets)
        ));
    }
}
