//! Relay engine
//!
//! Runs every submission through the same sequence regardless of transport:
//! validate, persist, forward to the receiver's live channel if one exists.
//! The persisted record is returned so the calling adapter can acknowledge
//! the submitter in whatever form its transport uses.

use std::sync::Arc;

use tracing::{debug, warn};

use cipherchat_core::storage::{MessageStore, UserStore};
use cipherchat_core::{InboundFrame, Message, MessageDraft, OutboundFrame};

use crate::error::{RelayError, Result};
use crate::registry::ConnectionRegistry;

/// One message submission, transport-agnostic
#[derive(Clone, Debug)]
pub struct Submission {
    /// Sending user; implied by the channel or passed explicitly
    pub sender_id: Option<i64>,
    /// Plaintext content
    pub content: String,
    /// Ciphertext
    pub encrypted_content: String,
    /// Receiving user, if the submitter named one
    pub receiver_id: Option<i64>,
}

impl Submission {
    /// Build a submission from a live-channel frame
    pub fn from_frame(sender_id: i64, frame: InboundFrame) -> Self {
        Self {
            sender_id: Some(sender_id),
            content: frame.content,
            encrypted_content: frame.encrypted_content,
            receiver_id: frame.receiver_id,
        }
    }
}

/// The relay engine
pub struct RelayEngine {
    users: Arc<dyn UserStore>,
    messages: Arc<dyn MessageStore>,
    registry: ConnectionRegistry,
    retain_plaintext: bool,
}

impl RelayEngine {
    /// Create an engine over the given stores and registry.
    ///
    /// Plaintext retention starts off: the stored record carries an empty
    /// `content` column while delivery and acknowledgment frames still echo
    /// the submitted plaintext.
    pub fn new(
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        registry: ConnectionRegistry,
    ) -> Self {
        Self {
            users,
            messages,
            registry,
            retain_plaintext: false,
        }
    }

    /// Opt in to persisting plaintext alongside ciphertext (debug use)
    pub fn with_plaintext_retention(mut self, retain: bool) -> Self {
        self.retain_plaintext = retain;
        self
    }

    /// The registry this engine forwards through
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Process one submission: validate, persist, forward.
    ///
    /// Validation failures and unknown participants abort before any side
    /// effect. A forward push that fails because the receiver's channel
    /// closed concurrently is logged and swallowed; the message is already
    /// durable at that point.
    pub async fn submit(&self, submission: Submission) -> Result<Message> {
        let receiver_id = Self::validate(&submission)?;

        let stored_content = if self.retain_plaintext {
            submission.content.clone()
        } else {
            String::new()
        };
        let draft = MessageDraft {
            content: stored_content,
            encrypted_content: submission.encrypted_content,
            sender_id: submission.sender_id,
            receiver_id,
        };

        let mut persisted = self.messages.append(draft).await?;
        if !self.retain_plaintext {
            // Frames echo the submitted plaintext even when the store does not
            // keep it.
            persisted.content = submission.content;
        }
        debug!(
            message_id = persisted.id,
            receiver_id, "message persisted"
        );

        if let Some(handle) = self.registry.lookup(receiver_id) {
            if !handle.send(OutboundFrame::message(persisted.clone())) {
                warn!(
                    message_id = persisted.id,
                    receiver_id, "receiver channel closed during forward; message stored"
                );
            }
        }

        Ok(persisted)
    }

    fn validate(submission: &Submission) -> Result<i64> {
        if submission.content.is_empty() {
            return Err(RelayError::Validation(
                "Message content cannot be empty".to_string(),
            ));
        }
        if submission.encrypted_content.is_empty() {
            return Err(RelayError::Validation(
                "Encrypted content is required".to_string(),
            ));
        }
        match submission.receiver_id {
            Some(id) if id > 0 => Ok(id),
            _ => Err(RelayError::Validation("Receiver ID is required".to_string())),
        }
    }

    /// The user store backing this engine
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// The message store backing this engine
    pub fn messages(&self) -> &Arc<dyn MessageStore> {
        &self.messages
    }
}
