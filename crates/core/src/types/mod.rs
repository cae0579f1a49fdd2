//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use price::{Price, PriceError};
pub use status::*;
