//! Application state shared across handlers

use common::{
    models::WelcomeJob, queue::JobQueue, repositories::UserRepository, session::SessionStore,
};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub sessions: SessionStore,
    pub welcome_queue: Arc<dyn JobQueue<WelcomeJob>>,
}
