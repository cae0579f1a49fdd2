//! Scripted shopping session.
//!
//! Signs in as the demo user (creating the account if the backend does not
//! have it), edits the cart, places an order and signs out. Every
//! [`ShopEvent`] is logged as it arrives.

use tokio::sync::broadcast::{self, error::RecvError};

use shopfront_core::ProductId;
use shopfront_storefront::services::auth::{AuthError, DEMO_EMAIL, DEMO_NAME, DEMO_PASSWORD};
use shopfront_storefront::{Backends, Shop, ShopConfig, ShopError, ShopEvent};

use super::CliError;

/// Run the demo against the configured backend.
///
/// # Errors
///
/// Returns `CliError` if the backend cannot be created or any step fails.
pub async fn run(config: &ShopConfig) -> Result<(), CliError> {
    let backends = Backends::from_config(config).await?;
    let mut shop = Shop::new(&backends, config).await;
    let logger = tokio::spawn(log_events(shop.subscribe()));

    let products = shop.products().await?;
    tracing::info!(count = products.len(), "Catalog loaded");

    let identity = match shop.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await {
        Err(ShopError::Auth(AuthError::InvalidCredentials)) => {
            tracing::info!("Demo account missing, signing up");
            shop.sign_up(DEMO_EMAIL, DEMO_NAME, DEMO_PASSWORD).await?
        }
        other => other?,
    };
    tracing::info!(user_id = %identity.user_id, "Signed in as {}", identity.display_name);

    let phone = ProductId::new("p1");
    let headphones = ProductId::new("p3");

    shop.add_to_cart(&phone).await?;
    shop.increase(&phone).await?;
    shop.add_to_cart(&headphones).await?;
    shop.decrease(&headphones).await?;
    tracing::info!(
        count = shop.cart_count(),
        total = %shop.cart_total().display(),
        "Cart ready"
    );

    let order = shop.place_order().await?;
    tracing::info!(
        order_id = %order.id,
        items = order.item_count(),
        total = %order.total.display(),
        "Checkout complete"
    );

    shop.sign_out().await?;

    // Closing the channel lets the logger finish.
    drop(shop);
    if let Err(e) = logger.await {
        tracing::warn!(error = %e, "Event logger stopped early");
    }
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<ShopEvent>) {
    loop {
        match events.recv().await {
            Ok(ShopEvent::SessionChanged(state)) => match state.identity() {
                Some(identity) => tracing::info!(user_id = %identity.user_id, "event: signed in"),
                None => tracing::info!("event: signed out"),
            },
            Ok(ShopEvent::CartChanged(cart)) => tracing::info!(
                lines = cart.lines.len(),
                count = cart.count,
                total = %cart.total.display(),
                "event: cart changed"
            ),
            Ok(ShopEvent::OrderPlaced(order)) => {
                tracing::info!(order_id = %order.id, "event: order placed");
            }
            Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "Event logger fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
