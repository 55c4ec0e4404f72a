//! Welcome notification for newly registered users

use async_trait::async_trait;
use common::{
    models::{User, WelcomeJob},
    repositories::UserRepository,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::worker::JobProcessor;

#[derive(Error, Debug)]
pub enum WelcomeError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Welcome failed: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Delivery channel for user notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn welcome(&self, user: &User) -> anyhow::Result<()>;
}

/// Notifier writing the greeting to the service log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn welcome(&self, user: &User) -> anyhow::Result<()> {
        info!(user_id = %user.id, "Welcome {}!", user.email);
        Ok(())
    }
}

/// Greets each registered user exactly once per job
pub struct WelcomeSender {
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
}

impl WelcomeSender {
    pub fn new(users: Arc<dyn UserRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { users, notifier }
    }
}

#[async_trait]
impl JobProcessor<WelcomeJob> for WelcomeSender {
    type Error = WelcomeError;

    async fn process(&self, job: &WelcomeJob) -> Result<(), WelcomeError> {
        let user = self
            .users
            .find_by_id(job.user_id)
            .await?
            .ok_or(WelcomeError::UserNotFound(job.user_id))?;

        self.notifier.welcome(&user).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{models::NewUser, repositories::MemoryUserRepository};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        greeted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn welcome(&self, user: &User) -> anyhow::Result<()> {
            self.greeted.lock().await.push(user.email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_welcomes_registered_user() {
        let users = MemoryUserRepository::new();
        let user = users
            .create(&NewUser {
                email: "alice@example.com".to_string(),
                password_digest: "digest".to_string(),
            })
            .await
            .unwrap();

        let notifier = Arc::new(Recording::default());
        let sender = WelcomeSender::new(Arc::new(users), notifier.clone());

        sender.process(&WelcomeJob { user_id: user.id }).await.unwrap();
        assert_eq!(*notifier.greeted.lock().await, vec!["alice@example.com"]);

        LogNotifier.welcome(&user).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_user_is_a_permanent_failure() {
        let notifier = Arc::new(Recording::default());
        let sender = WelcomeSender::new(Arc::new(MemoryUserRepository::new()), notifier.clone());

        let result = sender.process(&WelcomeJob { user_id: Uuid::new_v4() }).await;
        assert!(matches!(result, Err(WelcomeError::UserNotFound(_))));
        assert!(notifier.greeted.lock().await.is_empty());
    }
}
