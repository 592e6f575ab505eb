//! Ticket extraction from confirmation mail bodies.
//!
//! Recognition anchors on the vendor's fixed label lines (CRLF separated, in
//! fixed order with fixed boilerplate between them). Anything that drifts
//! from the template is not a ticket mail as far as this module is
//! concerned: the outcome is `None`, never an error.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

use crate::ticket::Ticket;

// Compile-once patterns via OnceLock.
fn re_body() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            "■チケット番号：(?P<ticket_number>\\d+)\r\n\
             ■登録電話番号：\\d+（下4ケタのみでOK）\r\n\
             \r\n\
             (?P<title>[^\r\n]+)\r\n\
             ■上映時間\r\n\
             (?P<date>[^\r\n]+)\r\n\
             ■劇場 （ワン：高島屋右隣／ツー：モノレール下遊歩道沿）\r\n\
             (?P<theater>[^\r\n]+)\r\n\
             ■座席\r\n\
             (?P<seat>[^\r\n]+(?:\r\n[^\r\n]+)*)\r\n",
        )
        .unwrap()
    })
}

fn re_screening_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            "(?P<year>\\d+)年(?P<month>\\d+)月(?P<day>\\d+)日\\(.\\) \
             (?P<start_hour>\\d\\d):(?P<start_min>\\d\\d) - \
             (?P<end_hour>\\d\\d):(?P<end_min>\\d\\d)",
        )
        .unwrap()
    })
}

/// Extract a [`Ticket`] from one plain-text mail body.
///
/// Returns `None` for anything that is not a ticket confirmation in the
/// expected template, the common case in a mixed mailbox. A body whose
/// labels match but whose screening-time block is malformed also yields
/// `None`: the structural match alone is not enough.
pub fn parse_body(body: &str) -> Option<Ticket> {
    let caps = re_body().captures(body)?;

    let (start_time, end_time) = parse_screening_times(&caps["date"])?;

    Some(Ticket {
        ticket_number: caps["ticket_number"].to_string(),
        title: caps["title"].to_string(),
        start_time,
        end_time,
        theater: caps["theater"].to_string(),
        seat: caps["seat"].to_string(),
    })
}

/// Parse a screening time block like `2024年3月29日(金) 12:00 - 15:00`.
///
/// Start and end share the date: a booking is assumed never to cross
/// midnight, so a post-midnight end simply lands before the start.
fn parse_screening_times(block: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let caps = re_screening_time().captures(block)?;

    let year: i32 = caps["year"].parse().ok()?;
    let month: u32 = caps["month"].parse().ok()?;
    let day: u32 = caps["day"].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let start = date.and_hms_opt(
        caps["start_hour"].parse().ok()?,
        caps["start_min"].parse().ok()?,
        0,
    )?;
    let end = date.and_hms_opt(
        caps["end_hour"].parse().ok()?,
        caps["end_min"].parse().ok()?,
        0,
    )?;

    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// A confirmation body in the vendor template, with surrounding
    /// boilerplate the way real mail carries it.
    fn confirmation_body(date_line: &str, seat_block: &str) -> String {
        format!(
            "ご購入ありがとうございます。\r\n\
             \r\n\
             ■チケット番号：240329001\r\n\
             ■登録電話番号：09012345678（下4ケタのみでOK）\r\n\
             \r\n\
             オッペンハイマー\r\n\
             ■上映時間\r\n\
             {date_line}\r\n\
             ■劇場 （ワン：高島屋右隣／ツー：モノレール下遊歩道沿）\r\n\
             シネマ・ツー a studio\r\n\
             ■座席\r\n\
             {seat_block}\r\n\
             \r\n\
             当日は開映時刻までにお越しください。\r\n"
        )
    }

    #[test]
    fn test_well_formed_body_recovers_all_fields() {
        let body = confirmation_body("2024年3月29日(金) 12:00 - 15:00", "G-12");

        let ticket = parse_body(&body).expect("template body should extract");

        let date = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        assert_eq!(ticket.ticket_number, "240329001");
        assert_eq!(ticket.title, "オッペンハイマー");
        assert_eq!(ticket.start_time, date.and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(ticket.end_time, date.and_hms_opt(15, 0, 0).unwrap());
        assert_eq!(ticket.theater, "シネマ・ツー a studio");
        assert_eq!(ticket.seat, "G-12");
    }

    #[test]
    fn test_multi_seat_booking_keeps_embedded_newlines() {
        let body = confirmation_body("2024年3月29日(金) 12:00 - 15:00", "G-12\r\nG-13");

        let ticket = parse_body(&body).expect("multi-seat body should extract");

        assert_eq!(ticket.seat, "G-12\r\nG-13");
    }

    #[test]
    fn test_unrelated_message_is_not_a_ticket() {
        let body = "いつもご利用ありがとうございます。\r\n\
                    今月のおすすめ作品をご案内します。\r\n";

        assert!(parse_body(body).is_none());
    }

    #[test]
    fn test_malformed_date_block_yields_no_ticket() {
        // Labels match, but the screening time line lacks the day-of-week
        // marker and the spaced hyphen. The first-stage match alone must
        // not produce a ticket.
        let body = confirmation_body("2024年3月29日 12:00-15:00", "G-12");

        assert!(parse_body(&body).is_none());
    }

    #[test]
    fn test_impossible_calendar_date_yields_no_ticket() {
        let body = confirmation_body("2024年13月1日(月) 10:00 - 12:00", "G-12");

        assert!(parse_body(&body).is_none());
    }

    #[test]
    fn test_post_midnight_show_keeps_end_before_start() {
        // Late show ending past midnight: both times share the date, so the
        // end lands before the start. Passed through unvalidated.
        let body = confirmation_body("2024年3月29日(金) 23:30 - 01:45", "G-12");

        let ticket = parse_body(&body).expect("late-show body should extract");

        assert!(ticket.end_time < ticket.start_time);
    }

    #[test]
    fn test_lf_only_body_does_not_match() {
        let body = confirmation_body("2024年3月29日(金) 12:00 - 15:00", "G-12").replace("\r\n", "\n");

        assert!(parse_body(&body).is_none());
    }
}
