//! Session management on top of the key-value cache
//!
//! A session is a random token bound to a user id under the key
//! `auth_<token>`, expiring after a fixed TTL. Tokens that were never issued
//! and tokens that expired are indistinguishable to callers.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::Cache;

/// Header carrying the session token on authenticated requests
pub const TOKEN_HEADER: &str = "X-Token";

/// Default session lifetime: 24 hours
pub const DEFAULT_SESSION_TTL: u64 = 60 * 60 * 24;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime in seconds
    pub ttl_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_SESSION_TTL,
        }
    }
}

impl SessionConfig {
    /// Create a new SessionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_TTL_SECONDS`: Session lifetime (default: 86400)
    pub fn from_env() -> Result<Self> {
        let ttl_seconds = std::env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL);

        Ok(Self { ttl_seconds })
    }
}

/// Token store backing authentication for every service
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn Cache>,
    ttl_seconds: u64,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(cache: Arc<dyn Cache>, config: &SessionConfig) -> Self {
        Self {
            cache,
            ttl_seconds: config.ttl_seconds,
        }
    }

    fn key(token: &str) -> String {
        format!("auth_{}", token)
    }

    /// Issue a new token for `user_id`
    ///
    /// Every call creates a fresh session; existing sessions of the same user
    /// stay valid.
    pub async fn issue(&self, user_id: Uuid) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        self.cache
            .set(&Self::key(&token), &user_id.to_string(), Some(self.ttl_seconds))
            .await?;

        info!("Issued session for user: {}", user_id);
        Ok(token)
    }

    /// Resolve a token to the user it was issued for
    ///
    /// Cache failures are returned as errors, never as "no session".
    pub async fn resolve(&self, token: &str) -> Result<Option<Uuid>> {
        if token.is_empty() {
            return Ok(None);
        }

        let Some(value) = self.cache.get(&Self::key(token)).await? else {
            return Ok(None);
        };

        match Uuid::parse_str(&value) {
            Ok(user_id) => Ok(Some(user_id)),
            Err(e) => {
                warn!("Ignoring malformed session value: {}", e);
                Ok(None)
            }
        }
    }

    /// Revoke a token; revoking an unknown token is a no-op
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.cache.delete(&Self::key(token)).await
    }

    /// Get cache health status
    pub async fn health_check(&self) -> Result<bool> {
        self.cache.health_check().await
    }
}
