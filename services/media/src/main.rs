use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    models::{ThumbnailJob, WelcomeJob},
    queue::{JobQueue, RedisQueue},
    repositories::{PgFileRepository, PgUserRepository},
    storage::{LocalBlobStore, StorageConfig},
};
use media::{
    config::MediaConfig,
    thumbnail_generator::ThumbnailGenerator,
    welcome::{LogNotifier, WelcomeSender},
    worker::WorkerPool,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting media worker service");

    let config = MediaConfig::from_env()?;

    // Initialize database connection
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    if !health_check(&pool).await? {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;
    let blobs = LocalBlobStore::from_config(&StorageConfig::from_env()?)?;

    let thumbnail_generator = ThumbnailGenerator::new(
        Arc::new(PgFileRepository::new(pool.clone())),
        Arc::new(blobs),
    );
    let welcome_sender = WelcomeSender::new(
        Arc::new(PgUserRepository::new(pool)),
        Arc::new(LogNotifier),
    );

    let (stop, shutdown) = watch::channel(false);

    let thumbnail_queue: Arc<dyn JobQueue<ThumbnailJob>> =
        Arc::new(RedisQueue::new(redis_pool.clone()));
    let welcome_queue: Arc<dyn JobQueue<WelcomeJob>> = Arc::new(RedisQueue::new(redis_pool));

    let mut thumbnail_workers = WorkerPool::new(
        thumbnail_queue,
        thumbnail_generator,
        config.thumbnail_pool(),
    )
    .spawn(shutdown.clone());

    let mut welcome_workers = WorkerPool::new(
        welcome_queue,
        welcome_sender,
        config.welcome_pool(),
    )
    .spawn(shutdown);

    info!("Media worker service started successfully");

    // Keep the service running
    tokio::signal::ctrl_c().await?;
    info!("Shutting down media worker service");

    stop.send(true)?;
    while let Some(result) = thumbnail_workers.join_next().await {
        if let Err(e) = result {
            error!("Thumbnail worker ended abnormally: {}", e);
        }
    }
    while let Some(result) = welcome_workers.join_next().await {
        if let Err(e) = result {
            error!("Welcome worker ended abnormally: {}", e);
        }
    }

    Ok(())
}
