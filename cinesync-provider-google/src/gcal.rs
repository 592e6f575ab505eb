//! Google Calendar API: list entries in a window, create new entries.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use cinesync_core::{CalendarEntry, EntryDraft};
use google_calendar::types::{EventDateTime, OrderBy, SendUpdates};

use crate::config;
use crate::google::{create_client, get_valid_tokens};

/// Convert a wall-clock time to an instant using the host's local zone.
fn to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Local time {} does not exist", naive))
}

fn entry_time_to_google(naive: NaiveDateTime) -> Result<EventDateTime> {
    Ok(EventDateTime {
        date: None,
        date_time: Some(to_utc(naive)?),
        time_zone: String::new(),
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Fetch entries overlapping `[time_min, time_max]` whose content matches
/// the search keyword.
pub async fn list_entries(
    account: &str,
    calendar_id: &str,
    time_min: NaiveDateTime,
    time_max: NaiveDateTime,
    search: &str,
) -> Result<Vec<CalendarEntry>> {
    let creds = config::load_credentials()?;
    let tokens = get_valid_tokens(account).await?;
    let client = create_client(&creds, &tokens);

    let time_min = to_utc(time_min)?.to_rfc3339();
    let time_max = to_utc(time_max)?.to_rfc3339();

    let response = client
        .events()
        .list_all(
            calendar_id,
            "",                 // i_cal_uid
            0,                  // max_attendees
            OrderBy::default(), // order_by
            &[],                // private_extended_property
            search,             // q (search query)
            &[],                // shared_extended_property
            false,              // show_deleted
            false,              // show_hidden_invitations
            false,              // single_events
            &time_max,
            &time_min,
            "",                 // time_zone
            "",                 // updated_min
        )
        .await
        .context("Failed to fetch calendar entries")?;

    let mut result = Vec::new();

    for event in response.body {
        if event.status == "cancelled" || event.id.is_empty() {
            continue;
        }

        // All-day events carry no dateTime; ticket entries always do.
        let start = event.start.as_ref().and_then(|t| t.date_time);
        let end = event.end.as_ref().and_then(|t| t.date_time);
        let (Some(start), Some(end)) = (start, end) else {
            log::debug!("Skipping all-day entry {}", event.id);
            continue;
        };

        result.push(CalendarEntry {
            id: event.id,
            title: if event.summary.is_empty() {
                "(No title)".to_string()
            } else {
                event.summary
            },
            start_time: start.with_timezone(&Local).naive_local(),
            end_time: end.with_timezone(&Local).naive_local(),
            description: non_empty(event.description),
            location: non_empty(event.location),
        });
    }

    Ok(result)
}

/// Create one entry. Returns the created entry as stored by Google.
pub async fn create_entry(
    account: &str,
    calendar_id: &str,
    draft: &EntryDraft,
) -> Result<CalendarEntry> {
    let creds = config::load_credentials()?;
    let tokens = get_valid_tokens(account).await?;
    let client = create_client(&creds, &tokens);

    let google_event = google_calendar::types::Event {
        summary: draft.title.clone(),
        description: draft.description.clone().unwrap_or_default(),
        location: draft.location.clone().unwrap_or_default(),
        start: Some(entry_time_to_google(draft.start_time)?),
        end: Some(entry_time_to_google(draft.end_time)?),
        ..Default::default()
    };

    let response = client
        .events()
        .insert(
            calendar_id,
            0,
            0,
            false,
            SendUpdates::None,
            false,
            &google_event,
        )
        .await
        .with_context(|| format!("Failed to create entry: {}", draft.title))?;

    let event = response.body;

    Ok(CalendarEntry {
        id: event.id,
        title: if event.summary.is_empty() {
            draft.title.clone()
        } else {
            event.summary
        },
        start_time: event
            .start
            .as_ref()
            .and_then(|t| t.date_time)
            .map(|dt| dt.with_timezone(&Local).naive_local())
            .unwrap_or(draft.start_time),
        end_time: event
            .end
            .as_ref()
            .and_then(|t| t.date_time)
            .map(|dt| dt.with_timezone(&Local).naive_local())
            .unwrap_or(draft.end_time),
        description: non_empty(event.description),
        location: non_empty(event.location),
    })
}
