//! Error types for the cinesync ecosystem.

use thiserror::Error;

/// Errors that can occur in cinesync operations.
#[derive(Error, Debug)]
pub enum CineSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider not installed: {0}")]
    ProviderNotInstalled(String),

    #[error("No tickets to derive a time window from")]
    NoTickets,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for cinesync operations.
pub type CineSyncResult<T> = Result<T, CineSyncError>;
