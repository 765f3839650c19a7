//! Error types for CipherChat core

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
#[derive(Debug, Error)]
pub enum Error {
    /// Submission or request failed validation
    #[error("{0}")]
    Validation(String),

    /// Receiver does not reference an existing user
    #[error("Receiver {0} does not exist")]
    UnknownReceiver(i64),

    /// Sender does not reference an existing user
    #[error("Sender {0} does not exist")]
    UnknownSender(i64),

    /// Nickname already registered
    #[error("Nickname already registered")]
    NicknameTaken(String),

    /// Live channel closed mid-operation
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Store connection lost or never established
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
