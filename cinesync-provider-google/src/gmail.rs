//! Gmail API v1: search for ticket confirmation mail.
//!
//! Lists messages matching the sender/date query, fetches each message's
//! plain-text body (URL-safe base64 in the payload tree), and groups the
//! results back into their conversation threads.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use cinesync_core::{MailMessage, MailThread};
use serde::Deserialize;
use std::collections::HashMap;

use crate::google::get_valid_tokens;

const MESSAGES_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageStub {
    id: String,
    #[serde(default)]
    thread_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDetail {
    #[serde(default)]
    payload: Option<MessagePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

// ============================================================================
// Gmail API
// ============================================================================

/// Build the Gmail search query: `(from:a OR from:b) AND newer:YYYY-MM-DD`.
fn build_query(senders: &[String], newer_than: &str) -> String {
    let from = senders
        .iter()
        .map(|address| format!("from:{}", address))
        .collect::<Vec<_>>()
        .join(" OR ");

    format!("({}) AND newer:{}", from, newer_than)
}

/// Search for messages from `senders` received on or after `newer_than`,
/// grouped into conversation threads in mailbox order.
pub async fn search_messages(
    account: &str,
    senders: &[String],
    newer_than: &str,
) -> Result<Vec<MailThread>> {
    if senders.is_empty() {
        anyhow::bail!("No sender addresses to search for");
    }

    let tokens = get_valid_tokens(account).await?;
    let client = reqwest::Client::new();
    let query = build_query(senders, newer_than);

    // List matching message ids, following pagination.
    let mut stubs: Vec<MessageStub> = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut request = client
            .get(MESSAGES_URL)
            .bearer_auth(&tokens.access_token)
            .query(&[("q", query.as_str())]);

        if let Some(ref token) = page_token {
            request = request.query(&[("pageToken", token.as_str())]);
        }

        let response = request
            .send()
            .await
            .context("Gmail message list request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gmail API error {}: {}", status.as_u16(), body);
        }

        let list: MessageListResponse = response
            .json()
            .await
            .context("Failed to decode Gmail message list")?;
        stubs.extend(list.messages);

        match list.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    // Fetch each body and group messages by thread, preserving list order.
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<MailMessage>> = HashMap::new();

    for stub in stubs {
        let body = fetch_message_body(&client, &tokens.access_token, &stub.id).await?;

        let thread_key = if stub.thread_id.is_empty() {
            stub.id.clone()
        } else {
            stub.thread_id.clone()
        };

        if !grouped.contains_key(&thread_key) {
            order.push(thread_key.clone());
        }
        grouped
            .entry(thread_key)
            .or_default()
            .push(MailMessage { id: stub.id, body });
    }

    Ok(order
        .into_iter()
        .map(|key| MailThread {
            messages: grouped.remove(&key).unwrap_or_default(),
        })
        .collect())
}

/// Fetch one message and pull out its plain-text body.
async fn fetch_message_body(
    client: &reqwest::Client,
    access_token: &str,
    id: &str,
) -> Result<String> {
    let response = client
        .get(format!("{}/{}", MESSAGES_URL, id))
        .bearer_auth(access_token)
        .query(&[("format", "full")])
        .send()
        .await
        .with_context(|| format!("Gmail message fetch failed: {}", id))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Gmail API error {} for message {}: {}", status.as_u16(), id, body);
    }

    let detail: MessageDetail = response
        .json()
        .await
        .with_context(|| format!("Failed to decode Gmail message {}", id))?;

    let payload = detail
        .payload
        .with_context(|| format!("Message {} has no payload", id))?;

    let data = find_plain_text(&payload)
        .with_context(|| format!("Message {} has no text/plain part", id))?;

    decode_body(data)
}

/// Depth-first search for the first text/plain part carrying data.
fn find_plain_text(part: &MessagePart) -> Option<&str> {
    if part.mime_type == "text/plain" {
        if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
            if !data.is_empty() {
                return Some(data);
            }
        }
    }

    part.parts.iter().find_map(find_plain_text)
}

/// Gmail body data is URL-safe base64, padding optional.
fn decode_body(data: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .context("Invalid base64 in message body")?;

    String::from_utf8(bytes).context("Message body is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;

    #[test]
    fn test_query_joins_senders_with_or() {
        let senders = vec![
            "ticket@cinemacity.co.jp".to_string(),
            "noreply@example.com".to_string(),
        ];

        assert_eq!(
            build_query(&senders, "2024-03-28"),
            "(from:ticket@cinemacity.co.jp OR from:noreply@example.com) AND newer:2024-03-28"
        );
    }

    #[test]
    fn test_decode_body_roundtrips_crlf_text() {
        let body = "■チケット番号：240329001\r\n";
        let encoded = URL_SAFE.encode(body.as_bytes());

        assert_eq!(decode_body(&encoded).unwrap(), body);
    }

    #[test]
    fn test_find_plain_text_descends_into_multipart() {
        let part = MessagePart {
            mime_type: "multipart/alternative".to_string(),
            body: None,
            parts: vec![
                MessagePart {
                    mime_type: "text/html".to_string(),
                    body: Some(PartBody {
                        data: Some("aHRtbA".to_string()),
                    }),
                    parts: vec![],
                },
                MessagePart {
                    mime_type: "text/plain".to_string(),
                    body: Some(PartBody {
                        data: Some("cGxhaW4".to_string()),
                    }),
                    parts: vec![],
                },
            ],
        };

        assert_eq!(find_plain_text(&part), Some("cGxhaW4"));
    }
}
