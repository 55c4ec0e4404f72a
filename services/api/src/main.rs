use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{AppState, config::ApiConfig, create_router, file_tree::FileTree};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    models::ThumbnailJob,
    queue::RedisQueue,
    repositories::{PgFileRepository, PgUserRepository},
    session::{SessionConfig, SessionStore},
    storage::{LocalBlobStore, StorageConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting API service");

    let config = ApiConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    let blobs = LocalBlobStore::from_config(&StorageConfig::from_env()?)?;

    let tree = FileTree::new(
        Arc::new(PgFileRepository::new(pool.clone())),
        Arc::new(blobs),
        Arc::new(RedisQueue::<ThumbnailJob>::new(redis_pool.clone())),
        config.thumbnail_sizes.clone(),
    );

    let app_state = AppState {
        tree,
        sessions: SessionStore::new(Arc::new(redis_pool), &SessionConfig::from_env()?),
        user_repository: Arc::new(PgUserRepository::new(pool)),
    };

    info!(
        "API service initialized successfully, thumbnail sizes {:?}",
        config.thumbnail_sizes
    );

    // Start the web server
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("API service listening on 0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
