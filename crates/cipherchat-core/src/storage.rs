//! Storage contracts for CipherChat
//!
//! Defines the durable-store interfaces the relay depends on, with an
//! in-memory implementation for tests and local runs. The relational
//! backend lives with the server binary.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::{Message, MessageDraft};
use crate::user::{NewUser, User};

/// Storage for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a user; fails with `NicknameTaken` on a duplicate nickname
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Get user by identifier
    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Get user by nickname
    async fn get_user_by_nickname(&self, nickname: &str) -> Result<Option<User>>;

    /// List users in identifier order
    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>>;

    /// Check whether a user exists
    async fn user_exists(&self, user_id: i64) -> Result<bool>;
}

/// Append-only storage for message records
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a draft atomically, assigning identifier and timestamp.
    ///
    /// Fails with `UnknownReceiver` (or `UnknownSender`) when a referenced
    /// user does not exist. Once this returns the record is durable.
    async fn append(&self, draft: MessageDraft) -> Result<Message>;

    /// All messages where the user is sender or receiver, newest first.
    ///
    /// Re-querying is safe and idempotent; the sequence is a snapshot, not
    /// a live stream.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Message>>;
}

/// In-memory storage for testing
pub mod memory {
    use super::*;

    use chrono::{DateTime, Utc};
    use parking_lot::RwLock;
    use std::sync::Arc;

    use crate::error::Error;

    #[derive(Default)]
    struct UserTable {
        next_id: i64,
        rows: Vec<User>,
    }

    #[derive(Default)]
    struct MessageLog {
        next_id: i64,
        last_timestamp: Option<DateTime<Utc>>,
        rows: Vec<Message>,
    }

    /// In-memory storage implementing both store traits
    #[derive(Default)]
    pub struct MemoryStorage {
        users: RwLock<UserTable>,
        messages: RwLock<MessageLog>,
    }

    impl MemoryStorage {
        /// Create new in-memory storage
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Number of persisted messages
        pub fn message_count(&self) -> usize {
            self.messages.read().rows.len()
        }
    }

    #[async_trait]
    impl UserStore for MemoryStorage {
        async fn create_user(&self, new_user: NewUser) -> Result<User> {
            let mut users = self.users.write();

            if users.rows.iter().any(|u| u.nickname == new_user.nickname) {
                return Err(Error::NicknameTaken(new_user.nickname));
            }

            users.next_id += 1;
            let user = User {
                id: users.next_id,
                nickname: new_user.nickname,
                public_key: new_user.public_key,
                private_key: new_user.private_key,
            };
            users.rows.push(user.clone());
            Ok(user)
        }

        async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
            Ok(self
                .users
                .read()
                .rows
                .iter()
                .find(|u| u.id == user_id)
                .cloned())
        }

        async fn get_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
            Ok(self
                .users
                .read()
                .rows
                .iter()
                .find(|u| u.nickname == nickname)
                .cloned())
        }

        async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>> {
            Ok(self
                .users
                .read()
                .rows
                .iter()
                .skip(skip.max(0) as usize)
                .take(limit.max(0) as usize)
                .cloned()
                .collect())
        }

        async fn user_exists(&self, user_id: i64) -> Result<bool> {
            Ok(self.users.read().rows.iter().any(|u| u.id == user_id))
        }
    }

    #[async_trait]
    impl MessageStore for MemoryStorage {
        async fn append(&self, draft: MessageDraft) -> Result<Message> {
            if !self.user_exists(draft.receiver_id).await? {
                return Err(Error::UnknownReceiver(draft.receiver_id));
            }
            if let Some(sender_id) = draft.sender_id {
                if !self.user_exists(sender_id).await? {
                    return Err(Error::UnknownSender(sender_id));
                }
            }

            let mut log = self.messages.write();

            // Clamp so timestamps never decrease across insertions.
            let mut timestamp = Utc::now();
            if let Some(last) = log.last_timestamp {
                if timestamp < last {
                    timestamp = last;
                }
            }
            log.last_timestamp = Some(timestamp);

            log.next_id += 1;
            let message = Message {
                id: log.next_id,
                content: draft.content,
                encrypted_content: draft.encrypted_content,
                sender_id: draft.sender_id,
                receiver_id: draft.receiver_id,
                timestamp,
            };
            log.rows.push(message.clone());
            Ok(message)
        }

        async fn list_for_user(&self, user_id: i64) -> Result<Vec<Message>> {
            let mut rows: Vec<Message> = self
                .messages
                .read()
                .rows
                .iter()
                .filter(|m| m.sender_id == Some(user_id) || m.receiver_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
            Ok(rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStorage;
    use super::*;
    use crate::error::Error;

    async fn register(storage: &MemoryStorage, nickname: &str) -> User {
        storage
            .create_user(NewUser::with_nickname(nickname))
            .await
            .expect("user created")
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_nickname() {
        let storage = MemoryStorage::new();
        register(&storage, "alice").await;

        let err = storage
            .create_user(NewUser::with_nickname("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NicknameTaken(_)));
    }

    #[tokio::test]
    async fn user_lookup_by_id_and_nickname() {
        let storage = MemoryStorage::new();
        let alice = register(&storage, "alice").await;

        let by_id = storage.get_user(alice.id).await.expect("lookup ok");
        assert_eq!(by_id, Some(alice.clone()));

        let by_nick = storage
            .get_user_by_nickname("alice")
            .await
            .expect("lookup ok");
        assert_eq!(by_nick, Some(alice));

        assert_eq!(storage.get_user(999).await.expect("lookup ok"), None);
    }

    #[tokio::test]
    async fn append_assigns_strictly_increasing_ids() {
        let storage = MemoryStorage::new();
        let alice = register(&storage, "alice").await;
        let bob = register(&storage, "bob").await;

        let first = storage
            .append(MessageDraft::new(Some(alice.id), bob.id, "one", "AAAA"))
            .await
            .expect("persisted");
        let second = storage
            .append(MessageDraft::new(Some(alice.id), bob.id, "two", "BBBB"))
            .await
            .expect("persisted");

        assert!(second.id > first.id);
        assert!(second.timestamp >= first.timestamp);
    }

    #[tokio::test]
    async fn append_rejects_unknown_participants() {
        let storage = MemoryStorage::new();
        let alice = register(&storage, "alice").await;

        let err = storage
            .append(MessageDraft::new(Some(alice.id), 42, "hi", "AAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownReceiver(42)));

        let err = storage
            .append(MessageDraft::new(Some(42), alice.id, "hi", "AAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSender(42)));
        assert_eq!(storage.message_count(), 0);
    }

    #[tokio::test]
    async fn list_for_user_is_newest_first_for_both_sides() {
        let storage = MemoryStorage::new();
        let alice = register(&storage, "alice").await;
        let bob = register(&storage, "bob").await;

        let older = storage
            .append(MessageDraft::new(Some(alice.id), bob.id, "old", "AAAA"))
            .await
            .expect("persisted");
        let newer = storage
            .append(MessageDraft::new(Some(bob.id), alice.id, "new", "BBBB"))
            .await
            .expect("persisted");

        for user_id in [alice.id, bob.id] {
            let listed = storage.list_for_user(user_id).await.expect("listable");
            assert_eq!(
                listed.iter().map(|m| m.id).collect::<Vec<_>>(),
                vec![newer.id, older.id]
            );
        }
    }

    #[tokio::test]
    async fn self_message_is_valid_and_listed_once() {
        let storage = MemoryStorage::new();
        let alice = register(&storage, "alice").await;

        storage
            .append(MessageDraft::new(Some(alice.id), alice.id, "note", "AAAA"))
            .await
            .expect("persisted");

        let listed = storage.list_for_user(alice.id).await.expect("listable");
        assert_eq!(listed.len(), 1);
    }
}
