//! Error types shared between the stock server and the table client.
//!
//! The `StockError` enum unifies the failure cases both sides run into: I/O,
//! JSON encoding, channel communication, configuration, and the three fetch
//! conditions the table pipeline distinguishes (rate limiting, generic fetch
//! failure, malformed responses).
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

use crate::page::ErrorCode;

/// Unified error type shared by server and client.
#[derive(Error, Debug)]
pub enum StockError {
    /// I/O error originating from the standard library or sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Invalid configuration value (bind address, URL, sizes).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream feed (or the query endpoint relaying it) answered HTTP 429.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Transport failure or non-success status from a remote endpoint.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// A remote endpoint answered with a body of unexpected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Crossbeam/channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Crossbeam/channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl StockError {
    /// Wire code reported to clients for this error.
    ///
    /// Only throttling is distinguished; every other failure is reported as a
    /// generic fetch error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            StockError::RateLimited(_) => ErrorCode::RateLimit,
            _ => ErrorCode::FetchError,
        }
    }

    /// Returns `true` for the throttling condition.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StockError::RateLimited(_))
    }
}

impl<T> From<PoisonError<T>> for StockError {
    fn from(err: PoisonError<T>) -> Self {
        StockError::MutexLock(err.to_string())
    }
}
