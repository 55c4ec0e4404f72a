//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload
///
/// The digest is computed by the caller; repositories never see plain
/// passwords.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_digest: String,
}
