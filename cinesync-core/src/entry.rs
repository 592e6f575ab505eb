//! Calendar entry types.
//!
//! These represent calendar events in a provider-agnostic way. Providers
//! convert their API responses into these types; the pipeline never sees a
//! provider's own event shape.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A calendar-resident event, as read back through the calendar collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Provider-assigned identifier.
    pub id: String,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// A new entry to create on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub description: Option<String>,
    pub location: Option<String>,
}
