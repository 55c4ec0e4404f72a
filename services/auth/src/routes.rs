//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use common::{error::StoreError, models::NewUser, models::WelcomeJob};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    middleware::{AuthUser, auth_middleware},
    password::{hash_password_blocking, verify_password_blocking},
    state::AppState,
    validation::{validate_email, validate_password},
};

/// Request for user registration
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response for user operations
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

/// Response for a successful login
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/disconnect", get(disconnect))
        .route("/users/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(create_user))
        .route("/connect", get(connect))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Register a new user and queue their welcome notification
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AuthResult<impl IntoResponse> {
    let email = payload.email.unwrap_or_default();
    validate_email(&email).map_err(AuthError::BadRequest)?;
    let password = payload.password.unwrap_or_default();
    validate_password(&password).map_err(AuthError::BadRequest)?;

    info!("Registration attempt for: {}", email);

    if state.user_repository.find_by_email(&email).await?.is_some() {
        return Err(AuthError::Conflict);
    }

    let new_user = NewUser {
        email,
        password_digest: hash_password_blocking(password).await?,
    };

    let user = match state.user_repository.create(&new_user).await {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => return Err(AuthError::Conflict),
        Err(StoreError::Backend(e)) => return Err(e.into()),
    };

    // The account exists at this point; a lost welcome is only logged
    if let Err(e) = state
        .welcome_queue
        .enqueue(&WelcomeJob { user_id: user.id })
        .await
    {
        warn!("Welcome job for user {} not queued: {}", user.id, e);
    }

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}

/// Exchange Basic credentials for a session token
pub async fn connect(
    State(state): State<AppState>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
) -> AuthResult<impl IntoResponse> {
    let TypedHeader(Authorization(basic)) = credentials.ok_or(AuthError::Unauthorized)?;
    if basic.username().is_empty() || basic.password().is_empty() {
        return Err(AuthError::Unauthorized);
    }

    let user = match state.user_repository.find_by_email(basic.username()).await? {
        Some(user) => user,
        None => {
            warn!("Login rejected for unknown user");
            return Err(AuthError::Unauthorized);
        }
    };

    let valid = verify_password_blocking(
        basic.password().to_string(),
        user.password_digest.clone(),
    )
    .await?;
    if !valid {
        warn!("Login rejected for user: {}", user.id);
        return Err(AuthError::Unauthorized);
    }

    let token = state.sessions.issue(user.id).await?;
    Ok((StatusCode::OK, Json(TokenResponse { token })))
}

/// Revoke the session the request was made with
pub async fn disconnect(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AuthResult<impl IntoResponse> {
    state.sessions.revoke(&user.token).await?;
    info!("Session closed for user: {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Return the authenticated user
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(user.id)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    Ok(Json(UserResponse {
        id: user.id,
        email: user.email,
    }))
}
