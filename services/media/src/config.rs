//! Worker configuration

use anyhow::Result;
use std::time::Duration;

use crate::worker::PoolConfig;

/// Configuration of the media workers
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub thumbnail_workers: usize,
    pub welcome_workers: usize,
    pub poll_interval: Duration,
}

impl MediaConfig {
    /// Create a new MediaConfig from environment variables
    ///
    /// # Environment Variables
    /// - `THUMBNAIL_WORKERS`: Concurrent thumbnail jobs (default: 4)
    /// - `WELCOME_WORKERS`: Concurrent welcome jobs (default: 1)
    /// - `QUEUE_POLL_SECONDS`: Longest wait of one dequeue (default: 5)
    pub fn from_env() -> Result<Self> {
        let thumbnail_workers = env_or("THUMBNAIL_WORKERS", 4usize).max(1);
        let welcome_workers = env_or("WELCOME_WORKERS", 1usize).max(1);
        let poll_seconds = env_or("QUEUE_POLL_SECONDS", 5u64).max(1);

        Ok(Self {
            thumbnail_workers,
            welcome_workers,
            poll_interval: Duration::from_secs(poll_seconds),
        })
    }

    pub fn thumbnail_pool(&self) -> PoolConfig {
        PoolConfig {
            workers: self.thumbnail_workers,
            poll_interval: self.poll_interval,
        }
    }

    pub fn welcome_pool(&self) -> PoolConfig {
        PoolConfig {
            workers: self.welcome_workers,
            poll_interval: self.poll_interval,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_media_config_defaults() {
        unsafe {
            env::remove_var("THUMBNAIL_WORKERS");
            env::remove_var("WELCOME_WORKERS");
            env::remove_var("QUEUE_POLL_SECONDS");
        }

        let config = MediaConfig::from_env().unwrap();
        assert_eq!(config.thumbnail_workers, 4);
        assert_eq!(config.welcome_workers, 1);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_media_config_from_env() {
        unsafe {
            env::set_var("THUMBNAIL_WORKERS", "8");
            env::set_var("WELCOME_WORKERS", "0");
            env::set_var("QUEUE_POLL_SECONDS", "not-a-number");
        }

        let config = MediaConfig::from_env().unwrap();
        assert_eq!(config.thumbnail_pool().workers, 8);
        assert_eq!(config.welcome_pool().workers, 1);
        assert_eq!(config.poll_interval, Duration::from_secs(5));

        unsafe {
            env::remove_var("THUMBNAIL_WORKERS");
            env::remove_var("WELCOME_WORKERS");
            env::remove_var("QUEUE_POLL_SECONDS");
        }
    }
}
