//! Provider subprocess client.
//!
//! This module handles communication with external provider binaries
//! (e.g., `cinesync-provider-google`) using JSON over stdin/stdout.
//!
//! The protocol is designed to be language-agnostic: any executable that
//! speaks the JSON protocol can be a provider. Providers manage their own
//! credentials and tokens; the CLI only passes the account identifier and
//! per-call parameters.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use cinesync_core::collaborators::{Calendar, MailSource};
use cinesync_core::error::{CineSyncError, CineSyncResult};
use cinesync_core::protocol::{Command as ProviderCommand, Request, Response};
use cinesync_core::{CalendarEntry, EntryDraft, MailThread};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::Config;

/// A client for communicating with a provider subprocess.
///
/// Providers are discovered by looking for executables named
/// `cinesync-provider-{name}` in PATH.
pub struct Provider {
    binary_path: PathBuf,
    account: String,
    calendar_id: Option<String>,
}

impl Provider {
    /// Create a provider client that is not yet bound to an account.
    ///
    /// Enough for `authenticate`; the pipeline needs [`Provider::from_config`].
    pub fn new(name: &str) -> CineSyncResult<Self> {
        let binary_name = format!("cinesync-provider-{}", name);
        let binary_path = which::which(&binary_name).map_err(|_| {
            CineSyncError::ProviderNotInstalled(format!(
                "{} (install it with `cargo install {}`)",
                name, binary_name
            ))
        })?;

        Ok(Self {
            binary_path,
            account: String::new(),
            calendar_id: None,
        })
    }

    /// Create a provider client bound to the configured account and calendar.
    pub fn from_config(config: &Config) -> CineSyncResult<Self> {
        let mut provider = Self::new(&config.provider)?;
        provider.account = config.account.clone();
        provider.calendar_id = config.calendar_id.clone();
        Ok(provider)
    }

    /// Run the provider's auth flow. Returns the account identifier.
    pub async fn authenticate(&self) -> CineSyncResult<String> {
        self.call(ProviderCommand::Authenticate, serde_json::json!({}))
            .await
    }

    /// Call a provider command and return the result.
    async fn call<R: DeserializeOwned>(
        &self,
        command: ProviderCommand,
        params: serde_json::Value,
    ) -> CineSyncResult<R> {
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| CineSyncError::Serialization(e.to_string()))?;

        let mut child = Command::new(&self.binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit()) // Let provider errors show in terminal
            .spawn()
            .map_err(|e| {
                CineSyncError::Provider(format!(
                    "Failed to spawn {}: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;

        // Write request to stdin (unwrap safe: we piped stdin above)
        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        // Wait for process and collect output
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CineSyncError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(CineSyncError::Provider(
                "Provider returned no response".into(),
            ));
        }

        let response: Response<R> = serde_json::from_str(&response_str)
            .map_err(|e| CineSyncError::Provider(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(CineSyncError::Provider(error)),
        }
    }
}

#[async_trait]
impl MailSource for Provider {
    async fn search(
        &self,
        senders: &[String],
        newer_than: NaiveDate,
    ) -> CineSyncResult<Vec<MailThread>> {
        self.call(
            ProviderCommand::SearchMessages,
            serde_json::json!({
                "account": self.account,
                "senders": senders,
                "newer_than": newer_than.format("%Y-%m-%d").to_string(),
            }),
        )
        .await
    }
}

#[async_trait]
impl Calendar for Provider {
    async fn entries_in(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        keyword: &str,
    ) -> CineSyncResult<Vec<CalendarEntry>> {
        self.call(
            ProviderCommand::ListEntries,
            serde_json::json!({
                "account": self.account,
                "calendar_id": self.calendar_id,
                "time_min": start,
                "time_max": end,
                "search": keyword,
            }),
        )
        .await
    }

    async fn create_entry(&self, draft: &EntryDraft) -> CineSyncResult<CalendarEntry> {
        self.call(
            ProviderCommand::CreateEntry,
            serde_json::json!({
                "account": self.account,
                "calendar_id": self.calendar_id,
                "entry": draft,
            }),
        )
        .await
    }
}
