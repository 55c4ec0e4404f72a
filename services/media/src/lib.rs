//! Media worker service
//!
//! Worker pools draining the thumbnail and welcome queues.

pub mod config;
pub mod thumbnail_generator;
pub mod welcome;
pub mod worker;
