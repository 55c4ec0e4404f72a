//! Authentication service
//!
//! Registration, Basic-auth login issuing session tokens, logout and the
//! current-user endpoint.

pub mod error;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
