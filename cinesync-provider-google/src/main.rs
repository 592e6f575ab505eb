//! cinesync-provider-google - Gmail + Google Calendar provider for cinesync-cli
//!
//! This binary implements the cinesync provider protocol, communicating
//! with cinesync-cli via JSON over stdin/stdout.
//!
//! The provider manages its own credentials and tokens:
//!   ~/.config/cinesync/providers/google/credentials.json
//!   ~/.config/cinesync/providers/google/tokens/{account}.json

mod config;
mod gcal;
mod gmail;
mod google;
mod types;

use chrono::NaiveDateTime;
use cinesync_core::EntryDraft;
use cinesync_core::protocol::{Command, Request, Response};
use serde::Deserialize;
use std::io::{self, BufRead, Write};

/// Google's alias for the user's main calendar
const DEFAULT_CALENDAR_ID: &str = "primary";

#[tokio::main]
async fn main() {
    env_logger::init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read stdin: {}", e);
                break;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let response = Response::error(&format!("Failed to parse request: {}", e));
                writeln!(stdout, "{}", response).unwrap();
                stdout.flush().unwrap();
                continue;
            }
        };

        let response = handle_request(request).await;

        writeln!(stdout, "{}", response).unwrap();
        stdout.flush().unwrap();
    }
}

async fn handle_request(request: Request) -> String {
    match request.command {
        Command::Authenticate => handle_authenticate().await,
        Command::SearchMessages => handle_search_messages(&request.params).await,
        Command::ListEntries => handle_list_entries(&request.params).await,
        Command::CreateEntry => handle_create_entry(&request.params).await,
    }
}

async fn handle_authenticate() -> String {
    match google::authenticate().await {
        Ok(account) => Response::success(account),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct SearchMessagesParams {
    account: String,
    senders: Vec<String>,
    /// Lower bound as YYYY-MM-DD; Gmail search has no finer precision.
    newer_than: String,
}

async fn handle_search_messages(params: &serde_json::Value) -> String {
    let params: SearchMessagesParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    match gmail::search_messages(&params.account, &params.senders, &params.newer_than).await {
        Ok(threads) => Response::success(threads),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct ListEntriesParams {
    account: String,
    calendar_id: Option<String>,
    time_min: NaiveDateTime,
    time_max: NaiveDateTime,
    search: String,
}

async fn handle_list_entries(params: &serde_json::Value) -> String {
    let params: ListEntriesParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let calendar_id = params.calendar_id.as_deref().unwrap_or(DEFAULT_CALENDAR_ID);

    match gcal::list_entries(
        &params.account,
        calendar_id,
        params.time_min,
        params.time_max,
        &params.search,
    )
    .await
    {
        Ok(entries) => Response::success(entries),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct CreateEntryParams {
    account: String,
    calendar_id: Option<String>,
    entry: EntryDraft,
}

async fn handle_create_entry(params: &serde_json::Value) -> String {
    let params: CreateEntryParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let calendar_id = params.calendar_id.as_deref().unwrap_or(DEFAULT_CALENDAR_ID);

    match gcal::create_entry(&params.account, calendar_id, &params.entry).await {
        Ok(entry) => Response::success(entry),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}
