//! Business logic services for the shop.
//!
//! # Services
//!
//! - `auth` - Auth provider seam, form validation, password hashing
//! - `catalog` - Product listing and lookup with caching
//! - `cart` - Cart store mirrored to the user's profile document
//! - `session` - Session gate driven by auth notifications
//! - `checkout` - Order placement

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod session;

pub use cart::CartStore;
pub use catalog::Catalog;
pub use checkout::CheckoutService;
pub use session::{SessionGate, SyncOutcome};
