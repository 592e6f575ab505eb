//! Mail types returned by the mail collaborator.

use serde::{Deserialize, Serialize};

/// A conversation thread: one or more messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailThread {
    pub messages: Vec<MailMessage>,
}

/// One message with its plain-text body.
///
/// Bodies keep the CRLF line endings of the source mail; extraction depends
/// on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    /// Provider-side message id, for diagnostics.
    #[serde(default)]
    pub id: String,
    pub body: String,
}
