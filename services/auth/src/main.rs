use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{AppState, create_router};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    models::WelcomeJob,
    queue::RedisQueue,
    repositories::PgUserRepository,
    session::{SessionConfig, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    let session_config = SessionConfig::from_env()?;
    let app_state = AppState {
        user_repository: Arc::new(PgUserRepository::new(pool)),
        sessions: SessionStore::new(Arc::new(redis_pool.clone()), &session_config),
        welcome_queue: Arc::new(RedisQueue::<WelcomeJob>::new(redis_pool)),
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = create_router(app_state);

    let port: u16 = std::env::var("AUTH_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Authentication service listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
