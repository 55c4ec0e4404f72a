//! Middleware for session token validation

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use common::session::TOKEN_HEADER;
use uuid::Uuid;

use crate::{error::AuthError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    /// The token the request was authenticated with
    pub token: String,
}

/// Resolve the `X-Token` header to a user
///
/// Missing, unknown and expired tokens are rejected alike; a cache failure
/// is an internal error rather than a rejection.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::Unauthorized)?
        .to_string();

    let user_id = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser { id: user_id, token });

    Ok(next.run(req).await)
}
