//! Integration tests for Shopfront.
//!
//! Scenarios drive a [`Shop`] wired to the in-memory backends, so they need
//! no database:
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! [`TestContext`] keeps handles to the concrete backends so tests can count
//! writes, inject write failures, and act as "another device" on the auth
//! provider.

use std::sync::Arc;

use shopfront_core::{Email, Identity, ProductId};
use shopfront_storefront::services::auth::{AuthProvider, DEMO_EMAIL, DEMO_PASSWORD, MemoryAuth};
use shopfront_storefront::store::{DocumentStore, MemoryStore, collections, into_document};
use shopfront_storefront::{Backends, Shop, ShopConfig};

/// Password used for every extra account the tests register.
pub const TEST_PASSWORD: &str = "hunter22";

/// A shop plus direct access to its backends.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<MemoryAuth>,
    pub shop: Shop,
}

impl TestContext {
    /// Fresh backends holding the demo account; nobody signed in.
    ///
    /// # Panics
    ///
    /// Panics if the demo account cannot be created.
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(
            MemoryAuth::with_demo_user()
                .await
                .expect("Failed to create demo account"),
        );
        let backends = Backends::new(store.clone(), auth.clone());
        let shop = Shop::new(&backends, &ShopConfig::default()).await;
        Self { store, auth, shop }
    }

    /// Fresh backends with the demo user signed in and the catalog seeded.
    ///
    /// # Panics
    ///
    /// Panics if sign-in or seeding fails.
    pub async fn signed_in() -> Self {
        let mut ctx = Self::new().await;
        ctx.shop
            .products()
            .await
            .expect("Failed to seed catalog");
        ctx.shop
            .sign_in(DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .expect("Failed to sign in demo user");
        ctx
    }

    /// Register another account without signing it in.
    ///
    /// # Panics
    ///
    /// Panics if the email is invalid or taken.
    pub async fn register(&self, email: &str, name: &str) -> Identity {
        let email = Email::parse(email).expect("Invalid test email");
        self.auth
            .register(&email, name, TEST_PASSWORD)
            .await
            .expect("Failed to register test account")
    }

    /// Sign out on the provider directly, as another device or an expired
    /// token would. The shop only notices on its next operation.
    ///
    /// # Panics
    ///
    /// Panics if the provider fails.
    pub async fn sign_out_elsewhere(&self) {
        self.auth.sign_out().await.expect("Failed to sign out");
    }

    /// Write a raw profile document for `identity`.
    ///
    /// # Panics
    ///
    /// Panics if `profile` is not an object or the write fails.
    pub async fn put_profile(&self, identity: &Identity, profile: serde_json::Value) {
        self.store
            .set_document(
                collections::USERS,
                identity.user_id.as_str(),
                into_document(profile).expect("Profile must be an object"),
            )
            .await
            .expect("Failed to write profile");
    }

    /// The stored `cart` field of `identity`'s profile.
    ///
    /// # Panics
    ///
    /// Panics if the profile does not exist.
    pub async fn stored_cart(&self, identity: &Identity) -> serde_json::Value {
        self.store
            .get_document(collections::USERS, identity.user_id.as_str())
            .await
            .expect("Profile missing")
            .get("cart")
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }

    /// Number of documents in `orders`.
    pub async fn order_count(&self) -> usize {
        self.store.len(collections::ORDERS).await
    }
}

/// Shorthand for a product id.
#[must_use]
pub fn pid(id: &str) -> ProductId {
    ProductId::new(id)
}
