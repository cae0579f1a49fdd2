//! Shop coordinator.
//!
//! [`Shop`] is the one object a view talks to. It owns the session gate, the
//! cart store and the catalog, and publishes a [`ShopEvent`] whenever the
//! session, the cart, or the order history changes. Methods take `&mut self`,
//! so operations on one shop never interleave.
//!
//! ```rust,ignore
//! let backends = Backends::memory().await?;
//! let mut shop = Shop::new(&backends, &ShopConfig::default()).await;
//! let mut events = shop.subscribe();
//!
//! shop.sign_in("user@example.com", "password123").await?;
//! shop.add_to_cart(&ProductId::new("p1")).await?;
//! let order = shop.place_order().await?;
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;

use shopfront_core::{Identity, Price, ProductId};

use crate::config::ShopConfig;
use crate::error::{Result, ShopError};
use crate::models::{CartSnapshot, Order, Product, SessionState};
use crate::services::auth::{AuthProvider, validate_sign_in, validate_sign_up};
use crate::services::session::new_profile;
use crate::services::{CartStore, Catalog, CheckoutService, SessionGate};
use crate::state::Backends;
use crate::store::{DocumentStore, collections};

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

/// Something a view may want to redraw for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopEvent {
    /// The signed-in identity changed.
    SessionChanged(SessionState),
    /// The cart's contents changed.
    CartChanged(CartSnapshot),
    /// An order was accepted by the store.
    OrderPlaced(Order),
}

/// Session, cart and catalog for one shopper.
pub struct Shop {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    catalog: Catalog,
    gate: SessionGate,
    carts: CartStore,
    events: broadcast::Sender<ShopEvent>,
}

impl Shop {
    /// Create a shop over `backends`. The session starts pending.
    pub async fn new(backends: &Backends, config: &ShopConfig) -> Self {
        let store = Arc::clone(backends.store());
        let auth = Arc::clone(backends.auth());
        let fallbacks = config.fallbacks();

        let gate = SessionGate::new(auth.as_ref(), Arc::clone(&store)).await;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            catalog: Catalog::new(Arc::clone(&store), fallbacks.clone(), config.catalog_ttl),
            carts: CartStore::new(Arc::clone(&store), fallbacks),
            gate,
            auth,
            store,
            events,
        }
    }

    /// Receive every event published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The session state as of the last applied notification.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        self.gate.state()
    }

    /// Validate the form, sign in, and load the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Auth` for invalid input or credentials, or
    /// `ShopError::Store` if the profile could not be loaded (the session is
    /// then anonymous).
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity> {
        let email = validate_sign_in(email, password)?;
        let identity = self.auth.sign_in(&email, password).await?;
        self.refresh_session().await?;
        Ok(identity)
    }

    /// Validate the form, create the account and its profile, and sign in.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Auth` for invalid input or a taken email, or
    /// `ShopError::Store` if the profile could not be written.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_up(&mut self, email: &str, name: &str, password: &str) -> Result<Identity> {
        let (email, name) = validate_sign_up(email, name, password)?;
        let identity = self.auth.sign_up(&email, &name, password).await?;

        let written = match new_profile(&identity) {
            Ok(doc) => {
                self.store
                    .set_document(collections::USERS, identity.user_id.as_str(), doc)
                    .await
            }
            Err(e) => Err(e),
        };
        self.refresh_session().await?;
        written?;

        tracing::info!(user_id = %identity.user_id, "Account created");
        Ok(identity)
    }

    /// Sign out. The local cart is emptied; nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Auth` if the provider fails.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.auth.sign_out().await?;
        self.refresh_session().await?;
        Ok(())
    }

    /// Apply notifications the provider queued, such as a sign-out that
    /// happened elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Store` if a sign-in's profile could not be loaded.
    /// The provider is then signed out as well, so the session stays
    /// anonymous and a later sign-in starts over.
    pub async fn refresh_session(&mut self) -> Result<&SessionState> {
        let cart_before = self.carts.snapshot();
        let outcome = self.gate.sync(&mut self.carts).await;

        if outcome.changed {
            self.publish(ShopEvent::SessionChanged(self.gate.state().clone()));
        }
        self.publish_cart_if_changed(&cart_before);

        if outcome.error.is_some() {
            // The provider still holds the identity the gate refused; without
            // this a retried sign-in is not a transition and never arrives.
            if let Err(e) = self.auth.sign_out().await {
                tracing::warn!(error = %e, "Could not sign out after failed profile load");
            }
            self.gate.sync(&mut self.carts).await;
        }

        outcome.into_result()?;
        Ok(self.gate.state())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All products, seeding the demo catalog on first use.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Store` if the catalog cannot be read.
    pub async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.catalog.list_products().await?)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// - `ShopError::Unauthenticated` if nobody is signed in
    /// - `ShopError::NotFound` if the product does not exist
    /// - `ShopError::PersistFailure` if the cart changed locally but was not
    ///   saved
    #[tracing::instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&mut self, product_id: &ProductId) -> Result<CartSnapshot> {
        let owner = self.require_identity().await?.user_id;
        let before = self.carts.snapshot();

        let result = if self.carts.cart().contains(product_id) {
            self.carts.increase(&owner, product_id).await
        } else {
            match self.catalog.get_product(product_id).await {
                Ok(product) => self.carts.add(&owner, &product).await,
                Err(e) if e.is_not_found() => Err(ShopError::NotFound(product_id.to_string())),
                Err(e) => Err(ShopError::Store(e)),
            }
        };

        self.publish_cart_if_changed(&before);
        result
    }

    /// Bump a line by one; no-op if the product is not in the cart.
    ///
    /// # Errors
    ///
    /// `ShopError::Unauthenticated` or `ShopError::PersistFailure`.
    pub async fn increase(&mut self, product_id: &ProductId) -> Result<CartSnapshot> {
        let owner = self.require_identity().await?.user_id;
        let before = self.carts.snapshot();
        let result = self.carts.increase(&owner, product_id).await;
        self.publish_cart_if_changed(&before);
        result
    }

    /// Take one unit off a line, removing it at zero; no-op if absent.
    ///
    /// # Errors
    ///
    /// `ShopError::Unauthenticated` or `ShopError::PersistFailure`.
    pub async fn decrease(&mut self, product_id: &ProductId) -> Result<CartSnapshot> {
        let owner = self.require_identity().await?.user_id;
        let before = self.carts.snapshot();
        let result = self.carts.decrease(&owner, product_id).await;
        self.publish_cart_if_changed(&before);
        result
    }

    /// Empty the cart and save the empty list. Safe to retry.
    ///
    /// # Errors
    ///
    /// `ShopError::Unauthenticated` or `ShopError::PersistFailure`.
    pub async fn clear_cart(&mut self) -> Result<CartSnapshot> {
        let owner = self.require_identity().await?.user_id;
        let before = self.carts.snapshot();
        let result = self
            .carts
            .clear(&owner)
            .await
            .map_err(ShopError::PersistFailure);
        self.publish_cart_if_changed(&before);
        result
    }

    /// Current cart contents.
    #[must_use]
    pub fn cart(&self) -> CartSnapshot {
        self.carts.snapshot()
    }

    /// `Σ price × quantity`.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.carts.cart().total()
    }

    /// `Σ quantity`.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.carts.cart().count()
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submit the cart as an order.
    ///
    /// # Errors
    ///
    /// See [`CheckoutService::place_order`]. On `PartialCheckout` the order
    /// stands and [`ShopEvent::OrderPlaced`] is still published.
    pub async fn place_order(&mut self) -> Result<Order> {
        let buyer = self.current_identity().await;
        let before = self.carts.snapshot();

        let result = CheckoutService::new(self.store.as_ref())
            .place_order(buyer.as_ref(), &mut self.carts)
            .await;

        self.publish_cart_if_changed(&before);
        match &result {
            Ok(order) => self.publish(ShopEvent::OrderPlaced(order.clone())),
            Err(ShopError::PartialCheckout { order, .. }) => {
                self.publish(ShopEvent::OrderPlaced(order.as_ref().clone()));
            }
            Err(_) => {}
        }
        result
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Apply queued notifications and return the signed-in identity, if any.
    ///
    /// A profile-load failure during the sync is reported and leaves the
    /// session anonymous.
    async fn current_identity(&mut self) -> Option<Identity> {
        if let Err(e) = self.refresh_session().await {
            e.report();
        }
        self.gate.state().identity().cloned()
    }

    async fn require_identity(&mut self) -> Result<Identity> {
        self.current_identity()
            .await
            .ok_or(ShopError::Unauthenticated)
    }

    fn publish_cart_if_changed(&self, before: &CartSnapshot) {
        let after = self.carts.snapshot();
        if &after != before {
            self.publish(ShopEvent::CartChanged(after));
        }
    }

    fn publish(&self, event: ShopEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::auth::MemoryAuth;
    use crate::store::MemoryStore;

    async fn shop() -> (Arc<MemoryStore>, Shop) {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(MemoryAuth::with_demo_user().await.unwrap());
        let backends = Backends::new(store.clone(), auth);
        let shop = Shop::new(&backends, &ShopConfig::default()).await;
        (store, shop)
    }

    fn drain(events: &mut broadcast::Receiver<ShopEvent>) -> Vec<ShopEvent> {
        std::iter::from_fn(|| events.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn test_anonymous_cart_operations_are_rejected() {
        let (store, mut shop) = shop().await;
        let p1 = ProductId::new("p1");

        assert!(matches!(
            shop.add_to_cart(&p1).await,
            Err(ShopError::Unauthenticated)
        ));
        assert!(matches!(
            shop.clear_cart().await,
            Err(ShopError::Unauthenticated)
        ));
        assert!(matches!(
            shop.place_order().await,
            Err(ShopError::Unauthenticated)
        ));
        assert_eq!(shop.session(), &SessionState::Anonymous);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_publishes_session_change() {
        let (_, mut shop) = shop().await;
        let mut events = shop.subscribe();

        let identity = shop.sign_in("user@example.com", "password123").await.unwrap();

        let seen = drain(&mut events);
        assert_eq!(
            seen.last(),
            Some(&ShopEvent::SessionChanged(SessionState::Authenticated(
                identity
            )))
        );
    }

    #[tokio::test]
    async fn test_failed_profile_load_signs_out_provider() {
        let (store, mut shop) = shop().await;
        store.fail_writes(collections::USERS).await;

        let err = shop.sign_in("user@example.com", "password123").await.unwrap_err();
        assert!(matches!(err, ShopError::Store(_)));
        assert_eq!(shop.session(), &SessionState::Anonymous);

        // Nothing stale is left queued for the gate.
        shop.refresh_session().await.unwrap();
        assert_eq!(shop.session(), &SessionState::Anonymous);

        store.restore_writes(collections::USERS).await;
        shop.sign_in("user@example.com", "password123").await.unwrap();
        assert!(shop.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let (_, mut shop) = shop().await;
        shop.sign_in("user@example.com", "password123").await.unwrap();
        shop.products().await.unwrap();

        let err = shop.add_to_cart(&ProductId::new("p99")).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(id) if id == "p99"));
        assert_eq!(shop.cart_count(), 0);
    }

    #[tokio::test]
    async fn test_cart_events_follow_mutations() {
        let (_, mut shop) = shop().await;
        shop.sign_in("user@example.com", "password123").await.unwrap();
        shop.products().await.unwrap();
        let mut events = shop.subscribe();
        let p1 = ProductId::new("p1");

        shop.add_to_cart(&p1).await.unwrap();
        shop.add_to_cart(&p1).await.unwrap();
        assert_eq!(shop.cart_total(), Price::from_cents(139_998));

        let seen = drain(&mut events);
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[1], ShopEvent::CartChanged(s) if s.count == 2));

        // No line, no change, no event.
        shop.decrease(&ProductId::new("p5")).await.unwrap();
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn test_place_order_emits_order_and_empty_cart() {
        let (_, mut shop) = shop().await;
        shop.sign_in("user@example.com", "password123").await.unwrap();
        shop.products().await.unwrap();
        shop.add_to_cart(&ProductId::new("p3")).await.unwrap();
        let mut events = shop.subscribe();

        let order = shop.place_order().await.unwrap();

        let seen = drain(&mut events);
        assert!(seen.contains(&ShopEvent::CartChanged(CartSnapshot::default())));
        assert_eq!(seen.last(), Some(&ShopEvent::OrderPlaced(order)));
        assert!(shop.cart().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_validates_before_provider() {
        let (store, mut shop) = shop().await;

        let err = shop.sign_up("not-an-email", "Al", "secret1").await.unwrap_err();
        assert!(matches!(err, ShopError::Auth(_)));
        let err = shop.sign_up("new@shop.test", "A", "secret1").await.unwrap_err();
        assert!(matches!(err, ShopError::Auth(_)));
        assert_eq!(store.write_count(), 0);

        let identity = shop.sign_up("new@shop.test", "New Shopper", "secret1").await.unwrap();
        assert_eq!(shop.session().identity(), Some(&identity));
        assert_eq!(store.len(collections::USERS).await, 1);
    }
}
