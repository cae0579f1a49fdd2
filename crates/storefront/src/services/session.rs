//! Session gate.
//!
//! Tracks who is signed in by consuming the auth provider's notifications,
//! and keeps the cart store in step: signing in hydrates the user's stored
//! cart, signing out empties the local cart without writing anything.
//!
//! Notifications are applied in arrival order. While the initial state is
//! unknown ([`SessionState::Pending`]) the gate waits for the first one
//! rather than guessing.

use std::sync::Arc;

use serde_json::json;

use shopfront_core::Identity;

use super::auth::{AuthEvents, AuthProvider};
use super::cart::CartStore;
use crate::error::{ShopError, clear_sentry_user, set_sentry_user};
use crate::models::SessionState;
use crate::models::session::profile;
use crate::store::{DocumentStore, StoreError, collections, into_document};

/// What [`SessionGate::sync`] did.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// The session state changed.
    pub changed: bool,
    /// A sign-in could not load its profile; the gate fell back to anonymous.
    pub error: Option<ShopError>,
}

impl SyncOutcome {
    /// Turn a recorded failure into an `Err`.
    ///
    /// # Errors
    ///
    /// Returns the recorded error, if any.
    pub fn into_result(self) -> Result<bool, ShopError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.changed),
        }
    }
}

/// Session state driven by auth-provider notifications.
pub struct SessionGate {
    store: Arc<dyn DocumentStore>,
    events: AuthEvents,
    state: SessionState,
}

impl SessionGate {
    /// Subscribe to `auth` and start in [`SessionState::Pending`].
    pub async fn new(auth: &dyn AuthProvider, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            events: auth.subscribe().await,
            state: SessionState::Pending,
        }
    }

    /// The last applied state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply every queued notification, waiting for the first one if the
    /// state is still pending.
    pub async fn sync(&mut self, carts: &mut CartStore) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();

        if self.state.is_pending() {
            // A closed channel means the provider is gone; nobody is signed in.
            let first = self.events.recv().await.unwrap_or(None);
            self.apply(first, carts, &mut outcome).await;
        }

        while let Ok(next) = self.events.try_recv() {
            self.apply(next, carts, &mut outcome).await;
        }

        outcome
    }

    async fn apply(
        &mut self,
        notification: Option<Identity>,
        carts: &mut CartStore,
        outcome: &mut SyncOutcome,
    ) {
        match notification {
            Some(identity) => {
                if self.state.identity() == Some(&identity) {
                    return;
                }
                match self.load_profile(&identity, carts).await {
                    Ok(()) => {
                        tracing::info!(user_id = %identity.user_id, "Signed in");
                        set_sentry_user(&identity.user_id, Some(identity.email.as_str()));
                        self.state = SessionState::Authenticated(identity);
                    }
                    Err(e) => {
                        tracing::debug!(
                            user_id = %identity.user_id,
                            error = %e,
                            "Could not load profile; staying signed out"
                        );
                        carts.reset();
                        clear_sentry_user();
                        self.state = SessionState::Anonymous;
                        outcome.error = Some(ShopError::Store(e));
                    }
                }
                outcome.changed = true;
            }
            None => {
                if self.state == SessionState::Anonymous {
                    return;
                }
                if let Some(user_id) = self.state.user_id() {
                    tracing::info!(user_id = %user_id, "Signed out");
                }
                carts.reset();
                clear_sentry_user();
                self.state = SessionState::Anonymous;
                outcome.changed = true;
            }
        }
    }

    /// Hydrate the cart from `users/{uid}`, creating the profile if missing.
    async fn load_profile(
        &self,
        identity: &Identity,
        carts: &mut CartStore,
    ) -> Result<(), StoreError> {
        let uid = identity.user_id.as_str();

        match self.store.get_document(collections::USERS, uid).await {
            Ok(doc) => {
                carts.hydrate(doc.get(profile::CART));
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(user_id = %uid, "Creating missing profile");
                self.store
                    .set_document(collections::USERS, uid, new_profile(identity)?)
                    .await?;
                carts.hydrate(None);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// A fresh `{email, name, cart: []}` profile document.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other document
/// encoders.
pub fn new_profile(identity: &Identity) -> Result<crate::store::Document, StoreError> {
    into_document(json!({
        profile::EMAIL: identity.email.as_str(),
        profile::NAME: identity.display_name,
        profile::CART: [],
    }))
}
