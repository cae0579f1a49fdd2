//! Shopfront storefront library.
//!
//! Keeps a shopper's cart consistent with their stored profile across
//! sign-in, sign-out, cart edits and checkout. [`Shop`] is the entry point;
//! views subscribe to its [`ShopEvent`]s and call its operations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod shop;
pub mod state;
pub mod store;
pub mod telemetry;

pub use config::ShopConfig;
pub use error::{Result, ShopError};
pub use shop::{Shop, ShopEvent};
pub use state::{BackendError, Backends};
