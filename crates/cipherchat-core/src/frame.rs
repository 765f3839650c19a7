//! Live-channel wire frames
//!
//! JSON frames exchanged over a user's live channel. Inbound frames carry a
//! message submission; outbound frames carry either a persisted message
//! (delivery or acknowledgment) or an error description.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// An inbound submission frame
///
/// The sender is implied by the channel the frame arrived on, so the payload
/// only names the receiver. Missing fields deserialize to their empty forms
/// and are rejected by relay validation rather than by the parser, matching
/// the per-field error messages the protocol promises.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InboundFrame {
    /// Plaintext content
    #[serde(default)]
    pub content: String,
    /// Ciphertext
    #[serde(default)]
    pub encrypted_content: String,
    /// Receiving user
    #[serde(default)]
    pub receiver_id: Option<i64>,
}

/// An outbound frame pushed to a live channel
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// A persisted message, pushed as delivery or acknowledgment
    Message {
        /// The persisted record
        data: Message,
    },
    /// A failure description; the channel stays open
    Error {
        /// Human-readable failure description
        message: String,
    },
}

impl OutboundFrame {
    /// Wrap a persisted message
    pub fn message(data: Message) -> Self {
        Self::Message { data }
    }

    /// Wrap a failure description
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to the wire encoding
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}
