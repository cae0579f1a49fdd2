//! Auth account repository.
//!
//! Backs [`crate::services::auth::PgAuth`]. Profiles (the `users`
//! collection) live in the documents table; this table only holds what the
//! auth provider needs to verify a sign-in.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shopfront_core::{Email, Identity, UserId};

use crate::store::StoreError;

#[derive(Debug, FromRow)]
struct AuthUserRow {
    id: UserId,
    email: String,
    display_name: String,
    password_hash: String,
}

impl AuthUserRow {
    fn into_identity(self) -> Result<(Identity, String), StoreError> {
        let email = Email::parse(&self.email).map_err(|e| {
            StoreError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let identity = Identity::new(self.id, email, self.display_name);
        Ok((identity, self.password_hash))
    }
}

/// Repository for auth account operations.
pub struct AuthUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthUserRepository<'a> {
    /// Create a new auth account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account and its password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    /// Returns `StoreError::DataCorruption` if the stored email is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Identity, String)>, StoreError> {
        let row = sqlx::query_as::<_, AuthUserRow>(
            r"
            SELECT id, email, display_name, password_hash
            FROM auth_users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(AuthUserRow::into_identity).transpose()
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email already exists.
    /// Returns `StoreError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
    ) -> Result<Identity, StoreError> {
        let id = UserId::new(Uuid::new_v4().simple().to_string());

        let row = sqlx::query_as::<_, AuthUserRow>(
            r"
            INSERT INTO auth_users (id, email, display_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, display_name, password_hash
            ",
        )
        .bind(&id)
        .bind(email.as_str())
        .bind(display_name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("email already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        row.into_identity().map(|(identity, _)| identity)
    }
}
