//! # CipherChat Core
//!
//! Core types, wire frames, and storage contracts for the CipherChat
//! message relay.
//!
//! This crate provides:
//! - User and message records
//! - Live-channel JSON frame types
//! - Storage traits with an in-memory implementation
//! - Common error types

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod frame;
pub mod message;
pub mod storage;
pub mod user;

pub use error::{Error, Result};
pub use frame::{InboundFrame, OutboundFrame};
pub use message::{Message, MessageDraft};
pub use user::{NewUser, User};

/// Maximum nickname length accepted at registration
pub const MAX_NICKNAME_LEN: usize = 50;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::frame::{InboundFrame, OutboundFrame};
    pub use crate::message::{Message, MessageDraft};
    pub use crate::storage::{MessageStore, UserStore};
    pub use crate::user::{NewUser, User};
}
