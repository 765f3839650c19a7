//! Error types for the chat server

use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

use cipherchat_crypto::CryptoError;
use cipherchat_relay::RelayError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Request failed validation
    BadRequest(String),
    /// Requested resource does not exist
    NotFound(String),
    /// Storage error
    Storage(String),
    /// Internal error
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "{}", msg),
            ApiError::NotFound(msg) => write!(f, "{}", msg),
            ApiError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let (status, code) = match self {
            ApiError::BadRequest(_) => (actix_web::http::StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (actix_web::http::StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
            ),
            ApiError::Internal(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        })
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Validation(msg) => ApiError::BadRequest(msg),
            RelayError::UnknownReceiver(_) | RelayError::UnknownSender(_) => {
                ApiError::NotFound(err.to_string())
            }
            RelayError::Storage(msg) => ApiError::Storage(msg),
        }
    }
}

impl From<cipherchat_core::Error> for ApiError {
    fn from(err: cipherchat_core::Error) -> Self {
        use cipherchat_core::Error;
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::NicknameTaken(_) => ApiError::BadRequest(err.to_string()),
            Error::UnknownReceiver(_) | Error::UnknownSender(_) => {
                ApiError::NotFound(err.to_string())
            }
            Error::Storage(msg) | Error::StoreUnavailable(msg) => ApiError::Storage(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyGeneration(msg) => ApiError::Internal(msg),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
