//! Domain models for the storefront.
//!
//! These are validated domain values, separate from the raw documents the
//! store hands back. Conversions in both directions go through
//! [`sanitize`], which is the only place malformed stored data is repaired.

pub mod cart;
pub mod order;
pub mod product;
pub mod sanitize;
pub mod session;

pub use cart::{Cart, CartLine, CartSnapshot, LineChange};
pub use order::{Order, OrderDraft};
pub use product::Product;
pub use sanitize::Fallbacks;
pub use session::SessionState;
