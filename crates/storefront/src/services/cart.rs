//! Cart store.
//!
//! Owns the active session's [`Cart`] and mirrors it to the owner's profile
//! document after every mutation. The local cart is authoritative: a failed
//! write is reported as [`ShopError::PersistFailure`] but the mutation stays.

use std::sync::Arc;

use serde_json::{Map, Value};

use shopfront_core::{ProductId, UserId};

use crate::error::{ShopError, add_breadcrumb};
use crate::models::sanitize::{sanitize_cart, sanitize_value, to_cart_value};
use crate::models::session::profile;
use crate::models::{Cart, CartLine, CartSnapshot, Fallbacks, LineChange, Product};
use crate::store::{DocumentStore, StoreError, collections};

/// The active cart plus its remote mirror.
pub struct CartStore {
    store: Arc<dyn DocumentStore>,
    fallbacks: Fallbacks,
    cart: Cart,
}

impl CartStore {
    /// An empty cart backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, fallbacks: Fallbacks) -> Self {
        Self {
            store,
            fallbacks,
            cart: Cart::new(),
        }
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.cart.snapshot()
    }

    /// Fallbacks applied when sanitizing.
    #[must_use]
    pub const fn fallbacks(&self) -> &Fallbacks {
        &self.fallbacks
    }

    /// Replace the local cart with a stored `cart` value, sanitizing it.
    ///
    /// A missing or non-array value hydrates an empty cart. Writes nothing.
    pub fn hydrate(&mut self, stored: Option<&Value>) {
        let lines = stored.map_or_else(Vec::new, |raw| sanitize_value(raw, &self.fallbacks));
        self.cart = Cart::from_lines(lines);
        tracing::debug!(lines = self.cart.len(), "Hydrated cart");
    }

    /// Empty the local cart without touching the store (sign-out).
    pub fn reset(&mut self) {
        self.cart = Cart::new();
    }

    /// The cart as it would be written: sanitized, in insertion order.
    #[must_use]
    pub fn sanitized_lines(&self) -> Vec<CartLine> {
        sanitize_cart(self.cart.lines(), &self.fallbacks)
    }

    /// Add one unit of `product`, appending a line if it is new.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::PersistFailure` if the write fails; the line is
    /// still added locally.
    #[tracing::instrument(skip(self, product), fields(user_id = %owner, product_id = %product.id))]
    pub async fn add(
        &mut self,
        owner: &UserId,
        product: &Product,
    ) -> Result<CartSnapshot, ShopError> {
        self.cart.add_product(product);
        line_breadcrumb("Added to cart", &product.id);
        self.persist_and_snapshot(owner).await
    }

    /// Bump a line by one. No-op without a write if the line is absent.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::PersistFailure` if the write fails.
    #[tracing::instrument(skip(self), fields(user_id = %owner, product_id = %product_id))]
    pub async fn increase(
        &mut self,
        owner: &UserId,
        product_id: &ProductId,
    ) -> Result<CartSnapshot, ShopError> {
        if !self.cart.increment(product_id) {
            tracing::debug!("No line to increase");
            return Ok(self.snapshot());
        }
        line_breadcrumb("Increased quantity", product_id);
        self.persist_and_snapshot(owner).await
    }

    /// Take one unit off a line, removing it at zero. No-op without a write
    /// if the line is absent.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::PersistFailure` if the write fails.
    #[tracing::instrument(skip(self), fields(user_id = %owner, product_id = %product_id))]
    pub async fn decrease(
        &mut self,
        owner: &UserId,
        product_id: &ProductId,
    ) -> Result<CartSnapshot, ShopError> {
        match self.cart.decrement(product_id) {
            None => {
                tracing::debug!("No line to decrease");
                return Ok(self.snapshot());
            }
            Some(LineChange::Removed) => line_breadcrumb("Removed from cart", product_id),
            Some(LineChange::Decremented(_)) => line_breadcrumb("Decreased quantity", product_id),
        }
        self.persist_and_snapshot(owner).await
    }

    /// Empty the cart and write the empty list. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns the store error if the write fails; the local cart is empty
    /// regardless.
    #[tracing::instrument(skip(self), fields(user_id = %owner))]
    pub async fn clear(&mut self, owner: &UserId) -> Result<CartSnapshot, StoreError> {
        self.cart.clear();
        self.persist(owner).await?;
        Ok(self.snapshot())
    }

    /// Write the sanitized cart to `users/{owner}`.
    ///
    /// Merges into the existing profile; creates a cart-only profile if the
    /// document is missing.
    ///
    /// # Errors
    ///
    /// Returns the store error if the write fails.
    pub async fn persist(&self, owner: &UserId) -> Result<(), StoreError> {
        let mut partial = Map::new();
        partial.insert(
            profile::CART.to_owned(),
            to_cart_value(&self.sanitized_lines()),
        );

        match self
            .store
            .update_document(collections::USERS, owner.as_str(), partial.clone())
            .await
        {
            Err(e) if e.is_not_found() => {
                tracing::warn!(user_id = %owner, "Profile missing, creating it with the cart");
                self.store
                    .set_document(collections::USERS, owner.as_str(), partial)
                    .await
            }
            other => other,
        }
    }

    async fn persist_and_snapshot(&self, owner: &UserId) -> Result<CartSnapshot, ShopError> {
        if let Err(e) = self.persist(owner).await {
            tracing::debug!(error = %e, "Cart persist failed; keeping local change");
            return Err(ShopError::PersistFailure(e));
        }
        Ok(self.snapshot())
    }
}

fn line_breadcrumb(message: &str, product_id: &ProductId) {
    add_breadcrumb("cart", message, Some(&[("product_id", product_id.as_str())]));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, into_document};
    use serde_json::json;
    use shopfront_core::Price;

    fn product(id: &str, cents: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_cents(cents),
            image: format!("https://img.test/{id}.png"),
        }
    }

    async fn setup() -> (Arc<MemoryStore>, CartStore, UserId) {
        let store = Arc::new(MemoryStore::new());
        let owner = UserId::new("u1");
        store
            .set_document(
                collections::USERS,
                owner.as_str(),
                into_document(json!({"email": "u1@shop.test", "name": "U One", "cart": []}))
                    .unwrap(),
            )
            .await
            .unwrap();
        let carts = CartStore::new(store.clone(), Fallbacks::default());
        (store, carts, owner)
    }

    async fn stored_cart(store: &MemoryStore, owner: &UserId) -> Value {
        store
            .get_document(collections::USERS, owner.as_str())
            .await
            .unwrap()
            .get(profile::CART)
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_mutations_are_mirrored() {
        let (store, mut carts, owner) = setup().await;
        let phone = product("p1", 69_999);

        carts.add(&owner, &phone).await.unwrap();
        carts.increase(&owner, &phone.id).await.unwrap();
        let cart = stored_cart(&store, &owner).await;
        assert_eq!(cart[0]["quantity"], json!(2));
        assert_eq!(cart[0]["price"], json!(699.99));

        carts.decrease(&owner, &phone.id).await.unwrap();
        carts.decrease(&owner, &phone.id).await.unwrap();
        assert_eq!(stored_cart(&store, &owner).await, json!([]));

        // profile fields survive the merge
        let profile_doc = store.get_document(collections::USERS, owner.as_str()).await.unwrap();
        assert_eq!(profile_doc["email"], json!("u1@shop.test"));
    }

    #[tokio::test]
    async fn test_absent_line_changes_write_nothing() {
        let (store, mut carts, owner) = setup().await;
        let writes = store.write_count();

        let id = ProductId::new("ghost");
        carts.increase(&owner, &id).await.unwrap();
        carts.decrease(&owner, &id).await.unwrap();
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_local_change() {
        let (store, mut carts, owner) = setup().await;
        store.fail_writes(collections::USERS).await;

        let err = carts.add(&owner, &product("p2", 129_999)).await.unwrap_err();
        assert!(matches!(err, ShopError::PersistFailure(_)));
        assert_eq!(carts.cart().count(), 1);
        assert_eq!(stored_cart(&store, &owner).await, json!([]));
    }

    #[tokio::test]
    async fn test_hydrate_sanitizes_and_writes_nothing() {
        let (store, mut carts, _) = setup().await;
        let writes = store.write_count();

        carts.hydrate(Some(&json!([
            {"productId": "p1", "name": "Smartphone", "price": 699.99, "quantity": 1},
            {"productId": "", "quantity": 1},
            {"productId": "p3", "quantity": "many"}
        ])));
        assert_eq!(carts.cart().len(), 1);
        assert_eq!(carts.cart().lines()[0].image, crate::models::sanitize::DEFAULT_PLACEHOLDER_IMAGE);

        carts.hydrate(None);
        assert!(carts.cart().is_empty());
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_missing_profile_is_created_on_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut carts = CartStore::new(store.clone(), Fallbacks::default());
        let owner = UserId::new("fresh");

        carts.add(&owner, &product("p4", 29_999)).await.unwrap();
        assert_eq!(stored_cart(&store, &owner).await[0]["productId"], json!("p4"));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let (store, mut carts, owner) = setup().await;
        carts.add(&owner, &product("p1", 100)).await.unwrap();

        assert!(carts.clear(&owner).await.unwrap().is_empty());
        assert!(carts.clear(&owner).await.unwrap().is_empty());
        assert_eq!(stored_cart(&store, &owner).await, json!([]));
    }
}
