//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in
//! the binary. Running them twice is harmless.
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection
//!   string

use shopfront_storefront::config::{ConfigError, ShopConfig};
use shopfront_storefront::{BackendError, db};

use super::CliError;

/// Run the storefront migrations.
///
/// # Errors
///
/// Returns `CliError` if no database URL is configured, the database is
/// unreachable, or a migration fails.
pub async fn run(config: &ShopConfig) -> Result<(), CliError> {
    let url = config
        .database_url
        .as_ref()
        .ok_or_else(|| ConfigError::MissingEnvVar("SHOPFRONT_DATABASE_URL".to_string()))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(url).await.map_err(BackendError::from)?;

    db::run_migrations(&pool).await?;
    Ok(())
}
