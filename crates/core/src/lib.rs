//! Shopfront Core - Shared types library.
//!
//! This crate provides common types used across all Shopfront components:
//! - `storefront` - Catalog, cart reconciliation, session gate and checkout
//! - `cli` - Command-line tools for migrations, seeding and the demo shell
//! - `integration-tests` - Scenario tests against the in-memory backends
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no auth provider. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for document IDs, prices, emails, identities and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
