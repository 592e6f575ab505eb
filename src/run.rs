//! The single-pass pipeline: fetch mail, extract tickets, diff against the
//! calendar, create what is missing.
//!
//! Generic over the collaborator traits so the whole pipeline runs against
//! in-memory fakes in tests. One invocation, one pass, no retry; a failed
//! collaborator call aborts the run.

use anyhow::Result;
use chrono::{Duration, Local};
use cinesync_core::collaborators::{Calendar, MailSource};
use cinesync_core::{extract, reconcile, Ticket};

/// Mail received since midnight this many days before the run is scanned.
const LOOKBACK_DAYS: i64 = 1;

/// The pipeline settings pulled out of [`crate::config::Config`].
pub struct RunSettings {
    pub senders: Vec<String>,
    pub search_key: String,
}

/// What a run decided, before (or without) writing anything.
pub struct RunPlan {
    /// Every ticket extracted from the mailbox this run.
    pub tickets: Vec<Ticket>,
    /// Messages that did not extract (unrelated mail, format drift).
    pub skipped: usize,
    /// Tickets with no covering calendar entry, in extraction order.
    pub missing: Vec<Ticket>,
    /// Tickets an existing entry already represents.
    pub covered: usize,
}

/// Outcome of an applied run.
pub struct RunSummary {
    pub plan: RunPlan,
    /// Titles of the entries created, in creation order.
    pub created: Vec<String>,
}

/// Fetch, extract, and reconcile without writing to the calendar.
pub async fn plan<M, C>(settings: &RunSettings, mail: &M, calendar: &C) -> Result<RunPlan>
where
    M: MailSource,
    C: Calendar,
{
    // Fixed lookback: midnight one calendar day before the invocation.
    let newer_than = (Local::now() - Duration::days(LOOKBACK_DAYS)).date_naive();

    let threads = mail.search(&settings.senders, newer_than).await?;

    let mut tickets = Vec::new();
    let mut skipped = 0usize;
    for thread in &threads {
        for message in &thread.messages {
            match extract::parse_body(&message.body) {
                Some(ticket) => tickets.push(ticket),
                None => {
                    skipped += 1;
                    log::debug!("No ticket in message {}", message.id);
                }
            }
        }
    }

    // Nothing extracted: a valid, quiet outcome. There is no time window to
    // derive, so the calendar is not consulted at all.
    if tickets.is_empty() {
        return Ok(RunPlan {
            tickets,
            skipped,
            missing: Vec::new(),
            covered: 0,
        });
    }

    let (window_start, window_end) = reconcile::coverage_window(&tickets)?;
    let entries = calendar
        .entries_in(window_start, window_end, &settings.search_key)
        .await?;

    let missing = reconcile::missing_tickets(&tickets, &entries);
    let covered = tickets.len() - missing.len();

    Ok(RunPlan {
        tickets,
        skipped,
        missing,
        covered,
    })
}

/// Run the pipeline once, creating an entry for every missing ticket.
///
/// Entries are created one at a time with no rollback: a failure partway
/// through leaves the earlier tickets registered.
pub async fn run_once<M, C>(settings: &RunSettings, mail: &M, calendar: &C) -> Result<RunSummary>
where
    M: MailSource,
    C: Calendar,
{
    let plan = plan(settings, mail, calendar).await?;

    let mut created = Vec::new();
    for ticket in &plan.missing {
        let draft = ticket.entry_draft(&settings.search_key);
        let entry = calendar.create_entry(&draft).await?;
        log::info!("Registered: {}", entry.title);
        created.push(entry.title);
    }

    Ok(RunSummary { plan, created })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use cinesync_core::error::{CineSyncError, CineSyncResult};
    use cinesync_core::{CalendarEntry, EntryDraft, MailMessage, MailThread};
    use std::sync::Mutex;

    fn settings() -> RunSettings {
        RunSettings {
            senders: vec!["ticket@cinemacity.co.jp".to_string()],
            search_key: "シネマシティ".to_string(),
        }
    }

    /// A confirmation body in the vendor template.
    fn confirmation_body(number: &str, title: &str, times: &str) -> String {
        format!(
            "■チケット番号：{number}\r\n\
             ■登録電話番号：09012345678（下4ケタのみでOK）\r\n\
             \r\n\
             {title}\r\n\
             ■上映時間\r\n\
             2024年3月29日(金) {times}\r\n\
             ■劇場 （ワン：高島屋右隣／ツー：モノレール下遊歩道沿）\r\n\
             シネマ・ツー a studio\r\n\
             ■座席\r\n\
             G-12\r\n\
             \r\n"
        )
    }

    fn thread_of(bodies: &[String]) -> MailThread {
        MailThread {
            messages: bodies
                .iter()
                .enumerate()
                .map(|(i, body)| MailMessage {
                    id: format!("msg-{i}"),
                    body: body.clone(),
                })
                .collect(),
        }
    }

    struct FakeMail {
        threads: Vec<MailThread>,
    }

    #[async_trait]
    impl MailSource for FakeMail {
        async fn search(
            &self,
            _senders: &[String],
            _newer_than: NaiveDate,
        ) -> CineSyncResult<Vec<MailThread>> {
            Ok(self.threads.clone())
        }
    }

    #[derive(Default)]
    struct FakeCalendar {
        existing: Vec<CalendarEntry>,
        created: Mutex<Vec<EntryDraft>>,
        fail_create: bool,
        queried: Mutex<Vec<(NaiveDateTime, NaiveDateTime, String)>>,
    }

    #[async_trait]
    impl Calendar for FakeCalendar {
        async fn entries_in(
            &self,
            start: NaiveDateTime,
            end: NaiveDateTime,
            keyword: &str,
        ) -> CineSyncResult<Vec<CalendarEntry>> {
            self.queried
                .lock()
                .unwrap()
                .push((start, end, keyword.to_string()));
            Ok(self.existing.clone())
        }

        async fn create_entry(&self, draft: &EntryDraft) -> CineSyncResult<CalendarEntry> {
            if self.fail_create {
                return Err(CineSyncError::Provider("calendar write failed".into()));
            }
            self.created.lock().unwrap().push(draft.clone());
            Ok(CalendarEntry {
                id: format!("evt-{}", self.created.lock().unwrap().len()),
                title: draft.title.clone(),
                start_time: draft.start_time,
                end_time: draft.end_time,
                description: draft.description.clone(),
                location: draft.location.clone(),
            })
        }
    }

    fn existing_entry(title: &str) -> CalendarEntry {
        let date = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        CalendarEntry {
            id: "evt-existing".to_string(),
            title: title.to_string(),
            start_time: date.and_hms_opt(12, 0, 0).unwrap(),
            end_time: date.and_hms_opt(14, 0, 0).unwrap(),
            description: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_registers_only_the_uncovered_ticket() {
        let mail = FakeMail {
            threads: vec![
                thread_of(&[confirmation_body("1001", "Movie A", "10:00 - 12:00")]),
                thread_of(&[
                    confirmation_body("1002", "Movie B", "13:00 - 15:00"),
                    "今月のおすすめ作品をご案内します。\r\n".to_string(),
                ]),
            ],
        };
        let calendar = FakeCalendar {
            existing: vec![existing_entry("Movie A Showing")],
            ..Default::default()
        };

        let summary = run_once(&settings(), &mail, &calendar).await.unwrap();

        assert_eq!(summary.created, ["Movie B"]);
        assert_eq!(summary.plan.tickets.len(), 2);
        assert_eq!(summary.plan.skipped, 1);
        assert_eq!(summary.plan.covered, 1);

        let created = calendar.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        let description = created[0].description.as_deref().unwrap();
        assert!(description.contains("シネマ・ツー a studio"));
        assert!(description.contains("1002"));
        assert_eq!(created[0].location.as_deref(), Some("シネマ・ツー a studio"));
    }

    #[tokio::test]
    async fn test_calendar_window_covers_every_ticket() {
        let mail = FakeMail {
            threads: vec![thread_of(&[
                confirmation_body("1001", "Movie A", "10:00 - 12:00"),
                confirmation_body("1002", "Movie B", "11:30 - 13:15"),
            ])],
        };
        let calendar = FakeCalendar::default();

        run_once(&settings(), &mail, &calendar).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        let queried = calendar.queried.lock().unwrap();
        assert_eq!(
            queried.as_slice(),
            [(
                date.and_hms_opt(10, 0, 0).unwrap(),
                date.and_hms_opt(13, 15, 0).unwrap(),
                "シネマシティ".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_empty_mailbox_completes_without_calendar_access() {
        let mail = FakeMail { threads: vec![] };
        let calendar = FakeCalendar::default();

        let summary = run_once(&settings(), &mail, &calendar).await.unwrap();

        assert!(summary.created.is_empty());
        assert!(summary.plan.tickets.is_empty());
        assert!(calendar.queried.lock().unwrap().is_empty());
        assert!(calendar.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unrelated_mail_only_is_skipped_not_fatal() {
        let mail = FakeMail {
            threads: vec![thread_of(&[
                "いつもご利用ありがとうございます。\r\n".to_string()
            ])],
        };
        let calendar = FakeCalendar::default();

        let summary = run_once(&settings(), &mail, &calendar).await.unwrap();

        assert_eq!(summary.plan.skipped, 1);
        assert!(summary.created.is_empty());
        assert!(calendar.queried.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_calendar_write_failure_aborts_the_run() {
        let mail = FakeMail {
            threads: vec![thread_of(&[confirmation_body(
                "1001",
                "Movie A",
                "10:00 - 12:00",
            )])],
        };
        let calendar = FakeCalendar {
            fail_create: true,
            ..Default::default()
        };

        assert!(run_once(&settings(), &mail, &calendar).await.is_err());
    }

    #[tokio::test]
    async fn test_plan_never_writes() {
        let mail = FakeMail {
            threads: vec![thread_of(&[confirmation_body(
                "1001",
                "Movie A",
                "10:00 - 12:00",
            )])],
        };
        let calendar = FakeCalendar::default();

        let plan = plan(&settings(), &mail, &calendar).await.unwrap();

        assert_eq!(plan.missing.len(), 1);
        assert!(calendar.created.lock().unwrap().is_empty());
    }
}
