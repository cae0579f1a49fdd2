//! `PostgreSQL`-backed auth provider.

use async_trait::async_trait;
use sqlx::PgPool;

use shopfront_core::{Email, Identity};

use super::{AuthError, AuthEvents, AuthProvider, Notifier, PasswordHashing};
use crate::db::users::AuthUserRepository;
use crate::store::StoreError;

/// Accounts in the `auth_users` table; the signed-in identity is per process.
pub struct PgAuth {
    pool: PgPool,
    hashing: PasswordHashing,
    notifier: Notifier,
}

impl PgAuth {
    /// Create a provider over `pool` with production hashing cost.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hashing: PasswordHashing::default(),
            notifier: Notifier::new(),
        }
    }

    fn users(&self) -> AuthUserRepository<'_> {
        AuthUserRepository::new(&self.pool)
    }
}

#[async_trait]
impl AuthProvider for PgAuth {
    fn provider_tag(&self) -> &'static str {
        "postgres"
    }

    #[tracing::instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        let (identity, password_hash) = self
            .users()
            .get_password_hash(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.hashing.verify(password, &password_hash)?;

        self.notifier.publish(Some(identity.clone())).await;
        Ok(identity)
    }

    #[tracing::instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        name: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let password_hash = self.hashing.hash(password)?;

        let identity = self
            .users()
            .create(email, name.trim(), &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailInUse,
                other => AuthError::Repository(other),
            })?;

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
