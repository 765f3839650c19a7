//! Error types for cipher operations

use thiserror::Error;

/// Result type alias for cipher operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cipher operations
///
/// Variants are split so callers can distinguish key-format problems from
/// data-format problems.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key is malformed or not valid PEM
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Plaintext cannot be encoded under the supplied key
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Ciphertext is malformed or does not match the supplied key
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Key pair generation failed
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),
}
