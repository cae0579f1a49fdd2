//! Unified error handling with Sentry integration.
//!
//! Every coordinator operation returns `Result<T, ShopError>`. Views show
//! [`ShopError::user_message`] and call [`ShopError::report`], which captures
//! backend failures to Sentry.

use thiserror::Error;

use crate::models::Order;
use crate::services::auth::AuthError;
use crate::store::StoreError;

/// Shop-level error type.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    Unauthenticated,

    /// Checkout was attempted with no line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Referenced product does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The local cart changed but could not be saved remotely.
    #[error("Cart could not be saved: {0}")]
    PersistFailure(#[source] StoreError),

    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The order was placed but clearing the remote cart failed.
    #[error("Order {} placed but the cart could not be cleared: {source}", .order.id)]
    PartialCheckout {
        /// The acknowledged order.
        order: Box<Order>,
        /// Why the clear failed.
        #[source]
        source: StoreError,
    },
}

impl ShopError {
    /// Text suitable for showing to the shopper.
    ///
    /// Never exposes backend details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Please sign in to continue".to_string(),
            Self::EmptyCart => "Your cart is empty".to_string(),
            Self::NotFound(_) => "That product is no longer available".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::EmailInUse => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) | AuthError::InvalidName(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::PersistFailure(_) => {
                "Your cart was updated but could not be saved".to_string()
            }
            Self::Store(_) => "Something went wrong, please try again".to_string(),
            Self::PartialCheckout { order, .. } => format!(
                "Order {} placed. Your cart could not be cleared; clear it to retry",
                order.id
            ),
        }
    }

    /// Whether the failure is on the backend side rather than the shopper's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::PersistFailure(_) | Self::Store(_) | Self::PartialCheckout { .. } => true,
            Self::Auth(err) => !err.is_user_error(),
            Self::Unauthenticated | Self::EmptyCart | Self::NotFound(_) => false,
        }
    }

    /// Log the error, capturing server-side failures to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Shop operation failed"
            );
        } else {
            tracing::info!(error = %self, "Shop operation rejected");
        }
    }
}

/// Result type alias for `ShopError`.
pub type Result<T> = std::result::Result<T, ShopError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for shopper actions.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "p1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
