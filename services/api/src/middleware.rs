//! Authentication middleware for session tokens

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use common::session::TOKEN_HEADER;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

fn token_of(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(TOKEN_HEADER)
        .and_then(|header| header.to_str().ok())
        .map(str::to_string)
}

async fn resolve_user(
    state: &AppState,
    token: Option<String>,
) -> Result<Option<AuthUser>, ApiError> {
    let Some(token) = token else {
        return Ok(None);
    };

    let user_id = state.sessions.resolve(&token).await?;
    Ok(user_id.map(|id| AuthUser { id }))
}

/// Require a valid `X-Token` header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_user(&state, token_of(&req))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Attach the user when a valid `X-Token` header is present
///
/// Requests without a valid token proceed anonymously.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(user) = resolve_user(&state, token_of(&req)).await? {
        req.extensions_mut().insert(user);
    }

    Ok(next.run(req).await)
}
