//! The ticket record extracted from one confirmation message.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entry::EntryDraft;

/// One screening booking, extracted from a confirmation email.
///
/// Times carry no timezone: the source mail states wall-clock times and the
/// calendar interprets them in its own zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Vendor booking identifier, digits only.
    pub ticket_number: String,
    /// Screening title. Used as the entry title and as the dedup matching key.
    pub title: String,
    pub start_time: NaiveDateTime,
    /// Expected to be after `start_time`, but not validated: a post-midnight
    /// show in the source mail produces an end before the start.
    pub end_time: NaiveDateTime,
    /// Venue label, also used as the entry location.
    pub theater: String,
    /// Seat label. Multi-seat bookings keep their embedded line breaks.
    pub seat: String,
}

impl Ticket {
    /// Build the calendar entry draft for this ticket.
    ///
    /// The description embeds the search keyword so later runs can find the
    /// entries we created when reading the calendar back.
    pub fn entry_draft(&self, search_key: &str) -> EntryDraft {
        let description = format!(
            "劇場: {}\n座席: {}\nチケット番号: {}\n検索用キーワード: {}",
            self.theater, self.seat, self.ticket_number, search_key
        );

        EntryDraft {
            title: self.title.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            description: Some(description),
            location: Some(self.theater.clone()),
        }
    }
}
