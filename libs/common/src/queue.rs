//! Job queues between the request path and the background workers
//!
//! A [`JobQueue`] is injected into producers (request handlers) and consumers
//! (worker pools) alike; there is no global queue state. Production queues are
//! Redis lists, so jobs survive a restart of either side.

use anyhow::Result;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::debug;

use crate::cache::RedisPool;
use crate::models::Job;

/// Durable FIFO handoff of jobs of one type
#[async_trait]
pub trait JobQueue<J: Job>: Send + Sync {
    /// Hand a job over; returns as soon as the job is queued
    async fn enqueue(&self, job: &J) -> Result<()>;

    /// Take the next job, waiting up to `wait` for one to arrive
    async fn dequeue(&self, wait: Duration) -> Result<Option<J>>;
}

/// Queue backed by a Redis list named after [`Job::QUEUE`]
pub struct RedisQueue<J> {
    redis_pool: RedisPool,
    _job: PhantomData<fn() -> J>,
}

impl<J> Clone for RedisQueue<J> {
    fn clone(&self) -> Self {
        Self {
            redis_pool: self.redis_pool.clone(),
            _job: PhantomData,
        }
    }
}

impl<J: Job> RedisQueue<J> {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self {
            redis_pool,
            _job: PhantomData,
        }
    }

    fn key() -> String {
        format!("queue:{}", J::QUEUE)
    }
}

#[async_trait]
impl<J: Job> JobQueue<J> for RedisQueue<J> {
    async fn enqueue(&self, job: &J) -> Result<()> {
        let payload = serde_json::to_string(job)?;
        self.redis_pool.push(&Self::key(), &payload).await?;
        debug!("Enqueued job on {}", J::QUEUE);
        Ok(())
    }

    async fn dequeue(&self, wait: Duration) -> Result<Option<J>> {
        // BRPOP treats 0 as "forever"
        let timeout = wait.as_secs_f64().max(0.01);
        match self.redis_pool.pop_blocking(&Self::key(), timeout).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}

#[cfg(any(test, feature = "memory"))]
pub use self::memory::MemoryQueue;

#[cfg(any(test, feature = "memory"))]
mod memory {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::{Mutex, mpsc};

    /// In-process queue over an unbounded channel
    ///
    /// Clones share the same channel, so one clone can be handed to the
    /// producer and another to the workers.
    pub struct MemoryQueue<J> {
        sender: mpsc::UnboundedSender<J>,
        receiver: Arc<Mutex<mpsc::UnboundedReceiver<J>>>,
    }

    impl<J> Clone for MemoryQueue<J> {
        fn clone(&self) -> Self {
            Self {
                sender: self.sender.clone(),
                receiver: self.receiver.clone(),
            }
        }
    }

    impl<J: Job> MemoryQueue<J> {
        pub fn new() -> Self {
            let (sender, receiver) = mpsc::unbounded_channel();
            Self {
                sender,
                receiver: Arc::new(Mutex::new(receiver)),
            }
        }
    }

    impl<J: Job> Default for MemoryQueue<J> {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl<J: Job + Clone> JobQueue<J> for MemoryQueue<J> {
        async fn enqueue(&self, job: &J) -> Result<()> {
            self.sender
                .send(job.clone())
                .map_err(|_| anyhow::anyhow!("Queue {} is closed", J::QUEUE))
        }

        async fn dequeue(&self, wait: Duration) -> Result<Option<J>> {
            let mut receiver = self.receiver.lock().await;
            match tokio::time::timeout(wait, receiver.recv()).await {
                Ok(job) => Ok(job),
                Err(_) => Ok(None),
            }
        }
    }
}
