//! Sign-in, sign-out, and identity switches as seen by the cart.

use serde_json::json;
use shopfront_integration_tests::{TEST_PASSWORD, TestContext, pid};
use shopfront_storefront::models::SessionState;
use shopfront_storefront::services::auth::{AuthError, DEMO_EMAIL, DEMO_PASSWORD};
use shopfront_storefront::store::collections;
use shopfront_storefront::{ShopError, ShopEvent};

#[tokio::test]
async fn test_sign_out_empties_cart_without_writing() {
    let mut ctx = TestContext::signed_in().await;
    let identity = ctx.shop.session().identity().cloned().expect("signed in");
    ctx.shop.add_to_cart(&pid("p1")).await.expect("add");
    ctx.shop.add_to_cart(&pid("p2")).await.expect("add");
    let writes = ctx.store.write_count();

    ctx.shop.sign_out().await.expect("sign out");

    assert_eq!(ctx.shop.session(), &SessionState::Anonymous);
    assert!(ctx.shop.cart().is_empty());
    assert_eq!(ctx.store.write_count(), writes);
    // The stored cart is untouched and comes back on the next sign-in.
    assert_eq!(ctx.stored_cart(&identity).await.as_array().map(Vec::len), Some(2));

    ctx.shop
        .sign_in(DEMO_EMAIL, DEMO_PASSWORD)
        .await
        .expect("sign in again");
    assert_eq!(ctx.shop.cart_count(), 2);
}

#[tokio::test]
async fn test_switching_identity_hydrates_their_own_cart() {
    let mut ctx = TestContext::signed_in().await;
    ctx.shop.add_to_cart(&pid("p1")).await.expect("add");

    let other = ctx.register("second@shop.test", "Second Shopper").await;
    ctx.put_profile(
        &other,
        json!({
            "email": "second@shop.test",
            "name": "Second Shopper",
            "cart": [
                {"productId": "p5", "name": "Tablet", "price": 499.99, "quantity": 3}
            ]
        }),
    )
    .await;

    ctx.shop.sign_out().await.expect("sign out");
    ctx.shop
        .sign_in("second@shop.test", TEST_PASSWORD)
        .await
        .expect("sign in as second");

    let cart = ctx.shop.cart();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.quantity_of(&pid("p5")), 3);
    assert_eq!(cart.quantity_of(&pid("p1")), 0);
    // Missing image picked up the placeholder.
    assert!(cart.lines[0].image.starts_with("https://"));
}

#[tokio::test]
async fn test_direct_switch_hydrates_new_identity_cart() {
    let mut ctx = TestContext::signed_in().await;
    let demo = ctx.shop.session().identity().cloned().expect("signed in");
    ctx.shop.add_to_cart(&pid("p1")).await.expect("add");

    let other = ctx.register("third@shop.test", "Third Shopper").await;
    ctx.put_profile(
        &other,
        json!({
            "email": "third@shop.test",
            "name": "Third Shopper",
            "cart": [
                {"productId": "p5", "name": "Tablet", "price": 499.99, "quantity": 1}
            ]
        }),
    )
    .await;

    // No sign-out in between.
    ctx.shop
        .sign_in("third@shop.test", TEST_PASSWORD)
        .await
        .expect("switch identity");

    assert_eq!(ctx.shop.session().identity(), Some(&other));
    let cart = ctx.shop.cart();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.quantity_of(&pid("p5")), 1);
    assert_eq!(cart.quantity_of(&pid("p1")), 0);
    // The previous shopper's stored cart is not touched by the switch.
    assert_eq!(ctx.stored_cart(&demo).await.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_retry_after_failed_profile_load_signs_in() {
    let mut ctx = TestContext::new().await;
    ctx.shop.products().await.expect("seed");
    ctx.store.fail_writes(collections::USERS).await;

    let err = ctx.shop.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap_err();
    assert!(matches!(err, ShopError::Store(_)));
    assert_eq!(ctx.shop.session(), &SessionState::Anonymous);
    assert!(ctx.shop.cart().is_empty());

    ctx.store.restore_writes(collections::USERS).await;
    let identity = ctx
        .shop
        .sign_in(DEMO_EMAIL, DEMO_PASSWORD)
        .await
        .expect("retry sign in");

    assert_eq!(ctx.shop.session().identity(), Some(&identity));
    ctx.shop.add_to_cart(&pid("p1")).await.expect("add after retry");
    assert_eq!(ctx.stored_cart(&identity).await.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_sign_out_elsewhere_is_applied_before_next_mutation() {
    let mut ctx = TestContext::signed_in().await;
    ctx.shop.add_to_cart(&pid("p1")).await.expect("add");
    let writes = ctx.store.write_count();

    ctx.sign_out_elsewhere().await;
    let err = ctx.shop.add_to_cart(&pid("p2")).await.unwrap_err();

    assert!(matches!(err, ShopError::Unauthenticated));
    assert!(ctx.shop.cart().is_empty());
    assert_eq!(ctx.store.write_count(), writes);
}

#[tokio::test]
async fn test_malformed_stored_cart_is_sanitized_on_sign_in() {
    let mut ctx = TestContext::new().await;
    ctx.shop.products().await.expect("seed");
    let demo = ctx.shop.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.expect("sign in");
    ctx.shop.sign_out().await.expect("sign out");

    ctx.put_profile(
        &demo,
        json!({
            "email": DEMO_EMAIL,
            "name": "Demo User",
            "cart": [
                {"productId": "p1", "price": "free", "quantity": 1},
                {"name": "no id", "quantity": 4},
                {"productId": "p2", "name": "Laptop", "price": 1299.99, "quantity": 0},
                {"productId": "p3", "name": "Headphones", "price": 199.99, "quantity": 2}
            ]
        }),
    )
    .await;

    ctx.shop.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.expect("sign in");
    let cart = ctx.shop.cart();

    assert_eq!(cart.lines.len(), 2);
    assert_eq!(cart.lines[0].name, "Unknown Product");
    assert_eq!(cart.lines[0].price.display(), "$0.00");
    assert_eq!(cart.count, 3);
}

#[tokio::test]
async fn test_new_account_gets_an_empty_profile() {
    let mut ctx = TestContext::new().await;

    let identity = ctx
        .shop
        .sign_up("fresh@shop.test", "Fresh Face", "secret1")
        .await
        .expect("sign up");

    assert_eq!(ctx.shop.session().identity(), Some(&identity));
    assert_eq!(ctx.stored_cart(&identity).await, json!([]));

    let err = ctx
        .shop
        .sign_up("fresh@shop.test", "Fresh Again", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::Auth(AuthError::EmailInUse)));
}

#[tokio::test]
async fn test_invalid_forms_never_reach_the_provider() {
    let mut ctx = TestContext::new().await;

    for (email, password) in [("", "password123"), ("user@", "password123"), (DEMO_EMAIL, "12345")] {
        let err = ctx.shop.sign_in(email, password).await.unwrap_err();
        assert!(matches!(err, ShopError::Auth(ref e) if e.is_user_error()), "{email}");
    }
    let err = ctx.shop.sign_in(DEMO_EMAIL, "wrong-password").await.unwrap_err();
    assert!(matches!(err, ShopError::Auth(AuthError::InvalidCredentials)));
    assert_eq!(ctx.store.write_count(), 0);
}

#[tokio::test]
async fn test_session_events_track_transitions() {
    let mut ctx = TestContext::new().await;
    let mut events = ctx.shop.subscribe();

    ctx.shop.refresh_session().await.expect("refresh");
    ctx.shop.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.expect("sign in");
    ctx.shop.sign_out().await.expect("sign out");

    let sessions: Vec<SessionState> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            ShopEvent::SessionChanged(state) => Some(state),
            _ => None,
        })
        .collect();

    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions[0], SessionState::Anonymous);
    assert!(sessions[1].is_authenticated());
    assert_eq!(sessions[2], SessionState::Anonymous);
}
