//! Postgres storage backend
//!
//! Implements the core store traits over sqlx. Identifier assignment and
//! timestamps come from the database (`bigserial`, `now()`), so ordering
//! guarantees hold across server restarts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use cipherchat_core::storage::{MessageStore, UserStore};
use cipherchat_core::{Error, Message, MessageDraft, NewUser, Result, User};

use crate::config::{RetryConfig, ServerConfig};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          BIGSERIAL PRIMARY KEY,
    nickname    VARCHAR(50) NOT NULL UNIQUE,
    public_key  TEXT,
    private_key TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    id                BIGSERIAL PRIMARY KEY,
    content           TEXT NOT NULL DEFAULT '',
    encrypted_content TEXT NOT NULL,
    sender_id         BIGINT REFERENCES users(id),
    receiver_id       BIGINT NOT NULL REFERENCES users(id),
    timestamp         TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver_id);
CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id);
"#;

/// Postgres-backed storage
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Connect with retry and ensure the schema exists.
    ///
    /// The database regularly comes up after the server under compose-style
    /// deployments, so connection refusal is retried with backoff before
    /// giving up with `StoreUnavailable`.
    pub async fn connect(config: &ServerConfig) -> Result<Self> {
        let pool = Self::connect_with_retry(config).await?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| Error::Storage(format!("schema setup failed: {e}")))?;

        Ok(Self { pool })
    }

    async fn connect_with_retry(config: &ServerConfig) -> Result<PgPool> {
        let retry: &RetryConfig = &config.retry;
        let mut last_error = String::new();

        for attempt in 0..retry.max_attempts {
            match PgPoolOptions::new()
                .max_connections(config.max_db_connections)
                .connect(&config.database_url)
                .await
            {
                Ok(pool) => {
                    info!(attempt, "connected to database");
                    return Ok(pool);
                }
                Err(e) => {
                    last_error = e.to_string();
                    let delay = retry.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %last_error,
                        "database connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(Error::StoreUnavailable(format!(
            "database unreachable after {} attempts: {last_error}",
            retry.max_attempts
        )))
    }

    fn map_sqlx(err: sqlx::Error) -> Error {
        Error::Storage(err.to_string())
    }

    fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .and_then(|db| db.code())
            .map(|code| code == "23505")
            .unwrap_or(false)
    }
}

type UserRow = (i64, String, Option<String>, Option<String>);
type MessageRow = (i64, String, String, Option<i64>, i64, DateTime<Utc>);

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.0,
        nickname: row.1,
        public_key: row.2,
        private_key: row.3,
    }
}

fn message_from_row(row: MessageRow) -> Message {
    Message {
        id: row.0,
        content: row.1,
        encrypted_content: row.2,
        sender_id: row.3,
        receiver_id: row.4,
        timestamp: row.5,
    }
}

#[async_trait]
impl UserStore for PgStorage {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (nickname, public_key, private_key) \
             VALUES ($1, $2, $3) \
             RETURNING id, nickname, public_key, private_key",
        )
        .bind(&new_user.nickname)
        .bind(&new_user.public_key)
        .bind(&new_user.private_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if Self::is_unique_violation(&e) {
                Error::NicknameTaken(new_user.nickname.clone())
            } else {
                Self::map_sqlx(e)
            }
        })?;

        Ok(user_from_row(row))
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, nickname, public_key, private_key FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_sqlx)?;

        Ok(row.map(user_from_row))
    }

    async fn get_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, nickname, public_key, private_key FROM users WHERE nickname = $1",
        )
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_sqlx)?;

        Ok(row.map(user_from_row))
    }

    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, nickname, public_key, private_key FROM users \
             ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(skip.max(0))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_sqlx)?;

        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_sqlx)?;

        Ok(row.is_some())
    }
}

#[async_trait]
impl MessageStore for PgStorage {
    async fn append(&self, draft: MessageDraft) -> Result<Message> {
        // Pre-check participants so the caller gets a deterministic error;
        // the foreign keys remain the backstop under concurrent deletes.
        if !self.user_exists(draft.receiver_id).await? {
            return Err(Error::UnknownReceiver(draft.receiver_id));
        }
        if let Some(sender_id) = draft.sender_id {
            if !self.user_exists(sender_id).await? {
                return Err(Error::UnknownSender(sender_id));
            }
        }

        let row: MessageRow = sqlx::query_as(
            "INSERT INTO messages (content, encrypted_content, sender_id, receiver_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, content, encrypted_content, sender_id, receiver_id, timestamp",
        )
        .bind(&draft.content)
        .bind(&draft.encrypted_content)
        .bind(draft.sender_id)
        .bind(draft.receiver_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_sqlx)?;

        Ok(message_from_row(row))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, content, encrypted_content, sender_id, receiver_id, timestamp \
             FROM messages WHERE sender_id = $1 OR receiver_id = $1 \
             ORDER BY timestamp DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_sqlx)?;

        Ok(rows.into_iter().map(message_from_row).collect())
    }
}
