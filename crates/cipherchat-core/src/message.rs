//! Message records for CipherChat
//!
//! A message is one directed communication between two users. Records are
//! immutable once persisted; the store assigns the identifier and timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned identifier, strictly increasing in insertion order
    pub id: i64,
    /// Plaintext content (retention is opt-in, see the relay configuration)
    pub content: String,
    /// Ciphertext, encrypted with the receiver's public key
    pub encrypted_content: String,
    /// Sending user, absent for system-originated sends
    pub sender_id: Option<i64>,
    /// Receiving user
    pub receiver_id: i64,
    /// Assigned at persistence time, non-decreasing per insertion order
    pub timestamp: DateTime<Utc>,
}

/// A message before persistence (no identifier or timestamp yet)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageDraft {
    /// Plaintext content
    pub content: String,
    /// Ciphertext
    pub encrypted_content: String,
    /// Sending user, if any
    pub sender_id: Option<i64>,
    /// Receiving user
    pub receiver_id: i64,
}

impl MessageDraft {
    /// Create a draft between two users
    pub fn new(
        sender_id: Option<i64>,
        receiver_id: i64,
        content: impl Into<String>,
        encrypted_content: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            encrypted_content: encrypted_content.into(),
            sender_id,
            receiver_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_iso8601_timestamp() {
        let message = Message {
            id: 7,
            content: "hello".to_string(),
            encrypted_content: "AAAA".to_string(),
            sender_id: Some(1),
            receiver_id: 2,
            timestamp: "2024-05-01T12:00:00Z".parse().expect("valid timestamp"),
        };

        let json = serde_json::to_value(&message).expect("serializable");
        assert_eq!(json["id"], 7);
        assert_eq!(json["sender_id"], 1);
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn sender_can_be_absent() {
        let json = serde_json::json!({
            "id": 1,
            "content": "",
            "encrypted_content": "AAAA",
            "sender_id": null,
            "receiver_id": 2,
            "timestamp": "2024-05-01T12:00:00Z",
        });

        let message: Message = serde_json::from_value(json).expect("deserializable");
        assert_eq!(message.sender_id, None);
    }
}
