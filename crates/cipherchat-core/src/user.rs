//! User records for CipherChat
//!
//! A user owns a unique nickname and an RSA key pair issued once at
//! registration. Records are immutable after creation; there is no key
//! rotation.

use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier
    pub id: i64,
    /// Unique nickname
    pub nickname: String,
    /// PEM-encoded RSA public key
    pub public_key: Option<String>,
    /// PEM-encoded RSA private key
    pub private_key: Option<String>,
}

/// A user pending registration (no identifier yet)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewUser {
    /// Requested nickname, must be unique
    pub nickname: String,
    /// PEM-encoded RSA public key
    pub public_key: Option<String>,
    /// PEM-encoded RSA private key
    pub private_key: Option<String>,
}

impl NewUser {
    /// Create a registration without key material
    pub fn with_nickname(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            public_key: None,
            private_key: None,
        }
    }

    /// Attach a key pair
    pub fn with_keys(
        mut self,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        self.public_key = Some(public_key.into());
        self.private_key = Some(private_key.into());
        self
    }
}
