//! Key-value cache module for the files manager
//!
//! This module provides the [`Cache`] abstraction used by the session store,
//! a Redis-backed implementation and, behind the `memory` feature, an
//! in-process implementation with the same TTL semantics.

use anyhow::Result;
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use tracing::info;

/// Key-value cache with optional per-key TTL
#[async_trait]
pub trait Cache: Send + Sync {
    /// Set a key-value pair with optional TTL
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()>;

    /// Get a value by key; expired keys read as absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete a key; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if the cache is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_MAX_CONNECTIONS`: Maximum number of connections (default: 10)
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let max_connections = std::env::var("REDIS_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        Ok(RedisConfig {
            url,
            max_connections,
        })
    }
}

/// Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Initialize a new Redis connection pool
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    /// Get a connection from the pool
    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Push a value on the head of a list
    pub async fn push(&self, list: &str, value: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.lpush(list, value).await?;
        Ok(())
    }

    /// Pop a value from the tail of a list, waiting up to `timeout_seconds`
    ///
    /// Uses its own connection: a blocking pop would otherwise stall every
    /// other command multiplexed on the same connection.
    pub async fn pop_blocking(&self, list: &str, timeout_seconds: f64) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let popped: Option<(String, String)> = conn.brpop(list, timeout_seconds).await?;
        Ok(popped.map(|(_, value)| value))
    }
}

#[async_trait]
impl Cache for RedisPool {
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        let mut conn = self.get_connection().await?;

        if let Some(ttl) = ttl_seconds {
            let _: () = conn.set_ex(key, value, ttl).await?;
        } else {
            let _: () = conn.set(key, value).await?;
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[cfg(any(test, feature = "memory"))]
pub use self::memory::MemoryCache;

#[cfg(any(test, feature = "memory"))]
mod memory {
    use super::Cache;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    /// In-process cache
    ///
    /// Expiry is measured with [`tokio::time::Instant`], so tests can drive
    /// it with a paused clock.
    #[derive(Clone, Default)]
    pub struct MemoryCache {
        entries: Arc<Mutex<HashMap<String, (String, Option<Instant>)>>>,
    }

    impl MemoryCache {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl Cache for MemoryCache {
        async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
            let expires = ttl_seconds.map(|ttl| Instant::now() + Duration::from_secs(ttl));
            self.entries
                .lock()
                .await
                .insert(key.to_string(), (value.to_string(), expires));
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            let mut entries = self.entries.lock().await;
            let expired = match entries.get(key) {
                None => return Ok(None),
                Some((_, Some(expires))) => Instant::now() >= *expires,
                Some((_, None)) => false,
            };

            if expired {
                entries.remove(key);
                return Ok(None);
            }

            Ok(entries.get(key).map(|(value, _)| value.clone()))
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.entries.lock().await.remove(key);
            Ok(())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }
}
