//! Files API service
//!
//! The [`FileTree`](file_tree::FileTree) and its HTTP surface: uploads,
//! listing, visibility and content downloads.

pub mod config;
pub mod error;
pub mod file_tree;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
