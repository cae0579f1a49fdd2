//! In-memory auth provider.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use shopfront_core::{Email, Identity, UserId};

use super::{AuthError, AuthEvents, AuthProvider, Notifier, PasswordHashing};

/// Email of the account [`MemoryAuth::with_demo_user`] seeds.
pub const DEMO_EMAIL: &str = "user@example.com";
/// Password of the demo account.
pub const DEMO_PASSWORD: &str = "password123";
/// Display name of the demo account.
pub const DEMO_NAME: &str = "Demo User";

#[derive(Debug, Clone)]
struct Account {
    user_id: UserId,
    name: String,
    password_hash: String,
}

/// Accounts kept in a process-local map.
#[derive(Debug)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<Email, Account>>,
    hashing: PasswordHashing,
    notifier: Notifier,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    /// A provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            hashing: PasswordHashing::lightweight(),
            notifier: Notifier::new(),
        }
    }

    /// A provider holding the demo account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the demo password cannot be hashed.
    pub async fn with_demo_user() -> Result<Self, AuthError> {
        let auth = Self::new();
        auth.register(&Email::parse(DEMO_EMAIL)?, DEMO_NAME, DEMO_PASSWORD)
            .await?;
        Ok(auth)
    }

    /// Create an account without signing it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailInUse` if the email is taken.
    pub async fn register(
        &self,
        email: &Email,
        name: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let password_hash = self.hashing.hash(password)?;

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(AuthError::EmailInUse);
        }

        let account = Account {
            user_id: UserId::new(Uuid::new_v4().simple().to_string()),
            name: name.trim().to_owned(),
            password_hash,
        };
        let identity = Identity::new(account.user_id.clone(), email.clone(), &account.name);
        accounts.insert(email.clone(), account);

        tracing::debug!(user_id = %identity.user_id, "Registered in-memory account");
        Ok(identity)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    fn provider_tag(&self) -> &'static str {
        "memory"
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        let account = self
            .accounts
            .lock()
            .await
            .get(email)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        self.hashing.verify(password, &account.password_hash)?;

        let identity = Identity::new(account.user_id, email.clone(), account.name);
        self.notifier.publish(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_up(
        &self,
        email: &Email,
        name: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let identity = self.register(email, name, password).await?;
        self.notifier.publish(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.notifier.publish(None).await;
        Ok(())
    }

    async fn subscribe(&self) -> AuthEvents {
        self.notifier.subscribe().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    /// The state a fresh subscriber is handed.
    async fn current(auth: &MemoryAuth) -> Option<Identity> {
        auth.subscribe().await.recv().await.flatten()
    }

    #[tokio::test]
    async fn test_demo_user_can_sign_in() {
        let auth = MemoryAuth::with_demo_user().await.unwrap();
        let identity = auth.sign_in(&email(DEMO_EMAIL), DEMO_PASSWORD).await.unwrap();
        assert_eq!(identity.display_name, DEMO_NAME);
        assert_eq!(current(&auth).await, Some(identity));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let auth = MemoryAuth::with_demo_user().await.unwrap();
        assert!(matches!(
            auth.sign_in(&email(DEMO_EMAIL), "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in(&email("nobody@example.com"), DEMO_PASSWORD).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(current(&auth).await.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rejects_taken_email() {
        let auth = MemoryAuth::with_demo_user().await.unwrap();
        assert!(matches!(
            auth.sign_up(&email(DEMO_EMAIL), "Someone", "secret1").await,
            Err(AuthError::EmailInUse)
        ));
    }

    #[tokio::test]
    async fn test_subscription_sees_sign_in_then_sign_out() {
        let auth = MemoryAuth::with_demo_user().await.unwrap();
        let mut events = auth.subscribe().await;
        assert_eq!(events.recv().await.unwrap(), None);

        let identity = auth.sign_in(&email(DEMO_EMAIL), DEMO_PASSWORD).await.unwrap();
        auth.sign_out().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), Some(identity));
        assert_eq!(events.recv().await.unwrap(), None);
    }
}
