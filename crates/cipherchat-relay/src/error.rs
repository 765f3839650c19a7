//! Relay error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;

/// Relay errors surfaced to submitters
#[derive(Debug, Error)]
pub enum RelayError {
    /// Submission failed validation; nothing was persisted or forwarded
    #[error("{0}")]
    Validation(String),

    /// Receiver does not reference an existing user
    #[error("Receiver {0} does not exist")]
    UnknownReceiver(i64),

    /// Sender does not reference an existing user
    #[error("Sender {0} does not exist")]
    UnknownSender(i64),

    /// The store failed while persisting
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<cipherchat_core::Error> for RelayError {
    fn from(err: cipherchat_core::Error) -> Self {
        use cipherchat_core::Error;
        match err {
            Error::Validation(msg) => RelayError::Validation(msg),
            Error::UnknownReceiver(id) => RelayError::UnknownReceiver(id),
            Error::UnknownSender(id) => RelayError::UnknownSender(id),
            other => RelayError::Storage(other.to_string()),
        }
    }
}
