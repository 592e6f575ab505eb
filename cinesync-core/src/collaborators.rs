//! Collaborator interfaces for mailbox and calendar access.
//!
//! The pipeline only ever talks to these traits. The production
//! implementation is the provider subprocess client in cinesync-cli; tests
//! substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::entry::{CalendarEntry, EntryDraft};
use crate::error::CineSyncResult;
use crate::mail::MailThread;

/// Read access to the mailbox.
#[async_trait]
pub trait MailSource {
    /// Search for threads from any of `senders`, received on or after
    /// `newer_than` (calendar-date precision, no time of day).
    async fn search(
        &self,
        senders: &[String],
        newer_than: NaiveDate,
    ) -> CineSyncResult<Vec<MailThread>>;
}

/// Read and write access to the calendar.
#[async_trait]
pub trait Calendar {
    /// Entries overlapping `[start, end]` whose content matches `keyword`.
    async fn entries_in(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        keyword: &str,
    ) -> CineSyncResult<Vec<CalendarEntry>>;

    /// Create one entry. Returns the created entry as stored.
    async fn create_entry(&self, draft: &EntryDraft) -> CineSyncResult<CalendarEntry>;
}
