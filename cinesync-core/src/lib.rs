//! Core types for the cinesync ecosystem.
//!
//! This crate provides the pieces shared by cinesync-cli and providers:
//! - `Ticket` and calendar entry types
//! - `extract` for pulling tickets out of confirmation mail bodies
//! - `reconcile` for diffing tickets against existing calendar entries
//! - `collaborators` traits for mailbox and calendar access
//! - `protocol` for the CLI-provider communication protocol

pub mod collaborators;
pub mod entry;
pub mod error;
pub mod extract;
pub mod mail;
pub mod protocol;
pub mod reconcile;
pub mod ticket;

// Re-export the common types at crate root for convenience
pub use entry::{CalendarEntry, EntryDraft};
pub use error::{CineSyncError, CineSyncResult};
pub use mail::{MailMessage, MailThread};
pub use ticket::Ticket;
