//! Backend wiring shared by every shop instance.

use std::sync::Arc;

use sqlx::PgPool;

use shopfront_core::BackendKind;

use crate::config::{ConfigError, ShopConfig};
use crate::db::{self, PgDocumentStore};
use crate::services::auth::{AuthError, AuthProvider, MemoryAuth, PgAuth};
use crate::store::{DocumentStore, MemoryStore};

/// Error creating the configured backends.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("auth provider error: {0}")]
    Auth(#[from] AuthError),
}

/// The document store and auth provider a shop runs against.
///
/// Cheaply cloneable; clones share the same backends.
#[derive(Clone)]
pub struct Backends {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
}

impl Backends {
    /// Wrap explicit backends (tests wire their own).
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    /// In-memory store plus an in-memory provider holding the demo account.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` if the demo account cannot be created.
    pub async fn memory() -> Result<Self, BackendError> {
        Ok(Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryAuth::with_demo_user().await?),
        ))
    }

    /// `PostgreSQL` store and provider sharing one pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgDocumentStore::new(pool.clone())),
            Arc::new(PgAuth::new(pool)),
        )
    }

    /// Build the backends `config` selects.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the database is unreachable or the demo
    /// account cannot be created.
    pub async fn from_config(config: &ShopConfig) -> Result<Self, BackendError> {
        match config.backend {
            BackendKind::Memory => Self::memory().await,
            BackendKind::Postgres => {
                let url = config.database_url.as_ref().ok_or_else(|| {
                    ConfigError::MissingEnvVar("SHOPFRONT_DATABASE_URL".to_string())
                })?;
                let pool = db::create_pool(url).await?;
                tracing::info!("Database pool created");
                Ok(Self::postgres(pool))
            }
        }
    }

    /// Get the document store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Get the auth provider.
    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }
}
