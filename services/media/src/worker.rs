//! Bounded pools of workers draining a job queue
//!
//! Each worker takes one job at a time and runs it to completion. Failures
//! are terminal for the job: they are logged and the worker moves on.

use anyhow::Result;
use async_trait::async_trait;
use common::{models::Job, queue::JobQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Processing of one job type
#[async_trait]
pub trait JobProcessor<J: Job>: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn process(&self, job: &J) -> Result<(), Self::Error>;
}

/// Number of workers and queue polling of a pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    /// How long one dequeue waits before checking for shutdown
    pub poll_interval: Duration,
}

/// A fixed number of workers sharing one queue and one processor
pub struct WorkerPool<J: Job, P> {
    queue: Arc<dyn JobQueue<J>>,
    processor: Arc<P>,
    config: PoolConfig,
}

impl<J: Job, P: JobProcessor<J>> WorkerPool<J, P> {
    pub fn new(queue: Arc<dyn JobQueue<J>>, processor: P, config: PoolConfig) -> Self {
        Self {
            queue,
            processor: Arc::new(processor),
            config,
        }
    }

    /// Take at most one job, waiting up to `wait`, and process it
    ///
    /// Returns whether a job was taken. Processing failures are logged, not
    /// returned; only a queue failure is an error.
    pub async fn run_once(&self, wait: Duration) -> Result<bool> {
        let Some(job) = self.queue.dequeue(wait).await? else {
            return Ok(false);
        };

        match self.processor.process(&job).await {
            Ok(()) => info!("Job on {} completed", J::QUEUE),
            Err(e) => error!("Job on {} failed: {}", J::QUEUE, e),
        }
        Ok(true)
    }

    /// Start the workers; they stop once `shutdown` turns true
    ///
    /// A job in progress is finished before its worker stops.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinSet<()> {
        let pool = Arc::new(self);
        let mut workers = JoinSet::new();

        for worker_id in 0..pool.config.workers.max(1) {
            let pool = pool.clone();
            let shutdown = shutdown.clone();
            workers.spawn(async move { pool.work(worker_id, shutdown).await });
        }

        info!(
            "Started {} workers on {}",
            pool.config.workers.max(1),
            J::QUEUE
        );
        workers
    }

    async fn work(&self, worker_id: usize, shutdown: watch::Receiver<bool>) {
        while !*shutdown.borrow() {
            if let Err(e) = self.run_once(self.config.poll_interval).await {
                warn!("Worker {} on {} cannot dequeue: {}", worker_id, J::QUEUE, e);
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        info!("Worker {} on {} stopped", worker_id, J::QUEUE);
    }
}
