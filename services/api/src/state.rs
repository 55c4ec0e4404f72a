//! Application state shared across handlers

use common::{repositories::UserRepository, session::SessionStore};
use std::sync::Arc;

use crate::file_tree::FileTree;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tree: FileTree,
    pub sessions: SessionStore,
    pub user_repository: Arc<dyn UserRepository>,
}
