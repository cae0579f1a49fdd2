//! Checkout pipeline.
//!
//! Validates, snapshots the sanitized cart into an order, and clears the
//! cart only after the store has acknowledged the order.

use shopfront_core::Identity;

use super::cart::CartStore;
use crate::error::{ShopError, add_breadcrumb};
use crate::models::{Order, OrderDraft};
use crate::store::{DocumentStore, collections};

/// Places orders for the signed-in user.
pub struct CheckoutService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Submit the cart as an order and clear it.
    ///
    /// `buyer` is `None` when nobody is signed in.
    ///
    /// # Errors
    ///
    /// - `ShopError::Unauthenticated` / `ShopError::EmptyCart` before any
    ///   write, with the cart untouched
    /// - `ShopError::Store` if the order could not be written; the cart is
    ///   untouched
    /// - `ShopError::PartialCheckout` if the order was written but the remote
    ///   cart could not be cleared; the local cart is already empty
    #[tracing::instrument(skip_all, fields(user_id = tracing::field::Empty))]
    pub async fn place_order(
        &self,
        buyer: Option<&Identity>,
        carts: &mut CartStore,
    ) -> Result<Order, ShopError> {
        let buyer = buyer.ok_or(ShopError::Unauthenticated)?;
        tracing::Span::current().record("user_id", tracing::field::display(&buyer.user_id));

        let items = carts.sanitized_lines();
        if items.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let timestamp = self.store.server_time().await?;
        let draft = OrderDraft::new(buyer.user_id.clone(), items, timestamp);
        let id = self
            .store
            .add_document(collections::ORDERS, draft.to_document()?)
            .await?;
        let order = draft.placed(id);

        tracing::info!(
            order_id = %order.id,
            total = %order.total,
            items = order.items.len(),
            "Order placed"
        );
        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));

        if let Err(source) = carts.clear(&buyer.user_id).await {
            tracing::debug!(order_id = %order.id, error = %source, "Cart not cleared after order");
            return Err(ShopError::PartialCheckout {
                order: Box::new(order),
                source,
            });
        }

        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use shopfront_core::{Email, Price, ProductId, UserId};

    use crate::models::{Fallbacks, Product};
    use crate::store::MemoryStore;

    fn buyer() -> Identity {
        Identity::new(
            UserId::new("u1"),
            Email::parse("u1@shop.test").unwrap(),
            "U One",
        )
    }

    fn product(id: &str, cents: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_cents(cents),
            image: format!("https://img.test/{id}.png"),
        }
    }

    #[tokio::test]
    async fn test_rejections_write_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut carts = CartStore::new(store.clone(), Fallbacks::default());
        let checkout = CheckoutService::new(store.as_ref());

        assert!(matches!(
            checkout.place_order(None, &mut carts).await,
            Err(ShopError::Unauthenticated)
        ));
        assert!(matches!(
            checkout.place_order(Some(&buyer()), &mut carts).await,
            Err(ShopError::EmptyCart)
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_order_snapshots_cart_then_clears() {
        let store = Arc::new(MemoryStore::new());
        let mut carts = CartStore::new(store.clone(), Fallbacks::default());
        let buyer = buyer();
        carts.add(&buyer.user_id, &product("p1", 69_999)).await.unwrap();
        carts.add(&buyer.user_id, &product("p1", 69_999)).await.unwrap();
        carts.add(&buyer.user_id, &product("p3", 19_999)).await.unwrap();
        let expected = carts.sanitized_lines();

        let order = CheckoutService::new(store.as_ref())
            .place_order(Some(&buyer), &mut carts)
            .await
            .unwrap();

        assert_eq!(order.items, expected);
        assert_eq!(order.total, Price::from_cents(159_997));
        assert!(carts.cart().is_empty());

        let stored = store
            .get_document(collections::ORDERS, order.id.as_str())
            .await
            .unwrap();
        assert_eq!(stored["status"], json!("placed"));
        assert_eq!(stored["userId"], json!("u1"));
        assert_eq!(stored["total"], json!(1599.97));
    }

    #[tokio::test]
    async fn test_failed_order_write_keeps_cart() {
        let store = Arc::new(MemoryStore::new());
        let mut carts = CartStore::new(store.clone(), Fallbacks::default());
        let buyer = buyer();
        carts.add(&buyer.user_id, &product("p2", 129_999)).await.unwrap();
        store.fail_writes(collections::ORDERS).await;

        let err = CheckoutService::new(store.as_ref())
            .place_order(Some(&buyer), &mut carts)
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::Store(_)));
        assert_eq!(carts.cart().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_clear_is_partial_checkout() {
        let store = Arc::new(MemoryStore::new());
        let mut carts = CartStore::new(store.clone(), Fallbacks::default());
        let buyer = buyer();
        carts.add(&buyer.user_id, &product("p6", 79_999)).await.unwrap();
        store.fail_writes(collections::USERS).await;

        let err = CheckoutService::new(store.as_ref())
            .place_order(Some(&buyer), &mut carts)
            .await
            .unwrap_err();
        let order = match err {
            ShopError::PartialCheckout { order, .. } => order,
            other => panic!("expected partial checkout, got {other:?}"),
        };
        assert_eq!(order.total, Price::from_cents(79_999));
        assert_eq!(store.len(collections::ORDERS).await, 1);
        assert!(carts.cart().is_empty());

        store.restore_writes(collections::USERS).await;
        carts.clear(&buyer.user_id).await.unwrap();
    }
}
