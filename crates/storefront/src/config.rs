//! Shop configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required for the `postgres` backend
//! - `SHOPFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! ## Optional
//! - `SHOPFRONT_BACKEND` - `memory` or `postgres` (default: memory)
//! - `SHOPFRONT_PLACEHOLDER_IMAGE` - Image URL for products without one
//! - `SHOPFRONT_CATALOG_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use shopfront_core::BackendKind;

use crate::models::Fallbacks;
use crate::models::sanitize::DEFAULT_PLACEHOLDER_IMAGE;

const DEFAULT_CATALOG_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct ShopConfig {
    /// Which document store and auth provider to use
    pub backend: BackendKind,
    /// `PostgreSQL` connection URL (contains password); set for `postgres`
    pub database_url: Option<SecretString>,
    /// Image substituted for products and cart lines without one
    pub placeholder_image: String,
    /// How long catalog entries stay cached
    pub catalog_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for ShopConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopConfig")
            .field("backend", &self.backend)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("placeholder_image", &self.placeholder_image)
            .field("catalog_ttl", &self.catalog_ttl)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl Default for ShopConfig {
    /// In-memory backends with default catalog settings.
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            database_url: None,
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            catalog_ttl: Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed, or if the `postgres`
    /// backend is selected without a database URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = parse_or_default(&lookup, "SHOPFRONT_BACKEND", BackendKind::Memory)?;

        let database_url = lookup("SHOPFRONT_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from);
        if backend == BackendKind::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "SHOPFRONT_DATABASE_URL".to_string(),
            ));
        }

        let placeholder_image = match lookup("SHOPFRONT_PLACEHOLDER_IMAGE") {
            Some(raw) if !raw.trim().is_empty() => Url::parse(raw.trim())
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "SHOPFRONT_PLACEHOLDER_IMAGE".to_string(),
                        e.to_string(),
                    )
                })?
                .to_string(),
            _ => DEFAULT_PLACEHOLDER_IMAGE.to_string(),
        };

        let ttl_secs = parse_or_default(
            &lookup,
            "SHOPFRONT_CATALOG_TTL_SECS",
            DEFAULT_CATALOG_TTL_SECS,
        )?;

        Ok(Self {
            backend,
            database_url,
            placeholder_image,
            catalog_ttl: Duration::from_secs(ttl_secs),
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty()),
        })
    }

    /// Fallbacks for decoding products and sanitizing carts.
    #[must_use]
    pub fn fallbacks(&self) -> Fallbacks {
        Fallbacks::with_image(self.placeholder_image.clone())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, using `default` when it is unset.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        _ => Ok(default),
    }
}
