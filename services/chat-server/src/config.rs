//! Server configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Chat server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Postgres connection string
    pub database_url: String,
    /// Maximum database connections in the pool
    pub max_db_connections: u32,
    /// Keep plaintext alongside ciphertext in storage
    pub retain_plaintext: bool,
    /// Database connect retry configuration
    pub retry: RetryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: String::new(),
            max_db_connections: 10,
            retain_plaintext: false,
            retry: RetryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("database_url must be set (flag or DATABASE_URL)".to_string());
        }
        if self.max_db_connections == 0 {
            return Err("max_db_connections must be > 0".to_string());
        }
        Ok(())
    }
}

/// Retry configuration for the initial database connection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum connection attempts
    pub max_attempts: u32,
    /// Initial delay in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before the given attempt (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_backs_off_and_caps() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(retry.delay_for_attempt(10), Duration::from_millis(10_000));
    }

    #[test]
    fn validate_requires_database_url() {
        let config = ServerConfig::default();
        assert!(config.validate().is_err());

        let config = ServerConfig {
            database_url: "postgres://localhost/chat".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
