//! Subcommand implementations.

pub mod demo;
pub mod migrate;
pub mod seed;
pub mod shell;

use shopfront_storefront::config::ConfigError;
use shopfront_storefront::store::StoreError;
use shopfront_storefront::{BackendError, ShopError};

/// Why a command failed.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Shop(#[from] ShopError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
