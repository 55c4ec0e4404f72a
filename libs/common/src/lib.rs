//! Common library for the files manager
//!
//! This crate provides shared functionality used across the services:
//! database and cache connectivity, the `users` and `files` repositories,
//! blob storage, job queues and the session store.
//!
//! Wiring of the production backends:
//!
//! ```rust,no_run
//! use common::cache::{RedisConfig, RedisPool};
//! use common::database::{DatabaseConfig, init_pool, run_migrations};
//! use common::session::{SessionConfig, SessionStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = init_pool(&DatabaseConfig::from_env()?).await?;
//!     run_migrations(&pool).await?;
//!
//!     let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;
//!     let sessions = SessionStore::new(Arc::new(redis_pool), &SessionConfig::from_env()?);
//!     let token = sessions.issue(uuid::Uuid::new_v4()).await?;
//!     println!("Issued {}", token);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
pub mod models;
pub mod queue;
pub mod repositories;
pub mod session;
pub mod storage;
