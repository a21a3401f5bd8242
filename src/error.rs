//! Custom error types for the crate.
//!
//! Each concern owns a small `thiserror` enum so callers can match on exactly
//! the failures that operation can produce:
//!
//! - **`RendezvousError`**: bounded waits on [`crate::sync::Rendezvous`]. A
//!   timeout here means the expected call or release never happened and must be
//!   treated as a failure, never as ordinary control flow.
//! - **`RelayError`**: lifecycle misuse of [`crate::scan::ScanDataRelay`].
//! - **`QueueProtocolError`**: malformed job-queue command or status beans.
//!
//! `GdaError` consolidates these together with configuration and I/O errors
//! for the binary and for composition roots, using `#[from]` so `?` works
//! across module boundaries.

use std::time::Duration;
use thiserror::Error;

use crate::queue::QueueCommand;

/// Convenience alias for results using the crate-wide error type.
pub type AppResult<T> = std::result::Result<T, GdaError>;

/// Failures of the rendezvous primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RendezvousError {
    /// A bounded wait passed its deadline.
    #[error("Timed out after {waited:?} waiting for {operation}")]
    Timeout {
        /// Which wait expired ("call" or "release").
        operation: &'static str,
        /// The timeout that was applied.
        waited: Duration,
    },

    /// The blocked party was interrupted before its condition was met.
    #[error("Interrupted while blocked on rendezvous")]
    Interrupted,

    /// Another worker is already inside the guarded section.
    #[error("Rendezvous is already occupied by another worker")]
    Occupied,
}

impl RendezvousError {
    /// Returns true for the timeout variant.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RendezvousError::Timeout { .. })
    }
}

/// Lifecycle errors of the scan data relay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// `connect()` was called on a relay that is already subscribed upstream.
    #[error("Relay is already connected to its scan event source")]
    AlreadyConnected,
}

/// Errors building or decoding job-queue protocol beans.
#[derive(Error, Debug)]
pub enum QueueProtocolError {
    /// A job command was issued without the job it applies to.
    #[error("Command {0} requires a job bean")]
    MissingJob(QueueCommand),

    /// The command is not addressed to any queue.
    #[error("Command {0} has neither a job queue id nor a queue name")]
    Unaddressed(QueueCommand),

    /// JSON encoding or decoding failed.
    #[error("Queue bean JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Primary error type for the application.
#[derive(Error, Debug)]
pub enum GdaError {
    /// Configuration file or environment parsing failed.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Configuration values parsed but are semantically invalid.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Standard I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream event could not be decoded.
    #[error("Event decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rendezvous wait failure.
    #[error(transparent)]
    Rendezvous(#[from] RendezvousError),

    /// Relay lifecycle failure.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Queue bean failure.
    #[error(transparent)]
    Queue(#[from] QueueProtocolError),

    /// Logging could not be initialised.
    #[error("Tracing initialisation failed: {0}")]
    Tracing(String),
}

impl From<figment::Error> for GdaError {
    fn from(err: figment::Error) -> Self {
        GdaError::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_operation() {
        let err = RendezvousError::Timeout {
            operation: "call",
            waited: Duration::from_millis(250),
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("waiting for call"));
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_conversions_into_gda_error() {
        let err: GdaError = RendezvousError::Interrupted.into();
        assert!(matches!(err, GdaError::Rendezvous(RendezvousError::Interrupted)));

        let err: GdaError = RelayError::AlreadyConnected.into();
        assert_eq!(
            err.to_string(),
            "Relay is already connected to its scan event source"
        );
    }
}
