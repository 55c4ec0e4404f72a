//! User repository for the `users` collection

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewUser, User};

/// Access to registered users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; fails with [`StoreError::Conflict`] when the email is taken
    async fn create(&self, new_user: &NewUser) -> Result<User, StoreError>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Number of registered users
    async fn count(&self) -> Result<i64>;

    /// Check if the backing store is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, StoreError> {
        info!("Creating new user: {}", new_user.email);

        if self.find_by_email(&new_user.email).await?.is_some() {
            return Err(StoreError::Conflict(new_user.email.clone()));
        }

        // The unique index still guards against a concurrent registration
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_digest)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_digest, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_digest)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_digest, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_digest, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(crate::database::health_check(&self.pool).await?)
    }
}

#[cfg(any(test, feature = "memory"))]
pub use self::memory::MemoryUserRepository;

#[cfg(any(test, feature = "memory"))]
mod memory {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-process user repository
    #[derive(Clone, Default)]
    pub struct MemoryUserRepository {
        users: Arc<RwLock<Vec<User>>>,
    }

    impl MemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl UserRepository for MemoryUserRepository {
        async fn create(&self, new_user: &NewUser) -> Result<User, StoreError> {
            let mut users = self.users.write().await;
            if users.iter().any(|u| u.email == new_user.email) {
                return Err(StoreError::Conflict(new_user.email.clone()));
            }

            let user = User {
                id: Uuid::new_v4(),
                email: new_user.email.clone(),
                password_digest: new_user.password_digest.clone(),
                created_at: Utc::now(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            let users = self.users.read().await;
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
            let users = self.users.read().await;
            Ok(users.iter().find(|u| u.id == id).cloned())
        }

        async fn count(&self) -> Result<i64> {
            Ok(self.users.read().await.len() as i64)
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, digest: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_digest: digest.to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() -> Result<()> {
        let repo = MemoryUserRepository::new();
        let original = repo.create(&new_user("bob@example.com", "first")).await?;

        let second = repo.create(&new_user("bob@example.com", "second")).await;
        assert!(matches!(second, Err(StoreError::Conflict(_))));

        let stored = repo.find_by_email("bob@example.com").await?.unwrap();
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.password_digest, "first");
        assert_eq!(repo.count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_by_id() -> Result<()> {
        let repo = MemoryUserRepository::new();
        let user = repo.create(&new_user("carol@example.com", "digest")).await?;

        assert_eq!(repo.find_by_id(user.id).await?.unwrap().email, "carol@example.com");
        assert!(repo.find_by_id(Uuid::new_v4()).await?.is_none());
        Ok(())
    }
}
