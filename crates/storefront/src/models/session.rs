//! Session state.
//!
//! Types describing who owns the cart right now.

use serde::Serialize;

use shopfront_core::{Identity, UserId};

/// Authentication state as last reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "identity", rename_all = "snake_case")]
pub enum SessionState {
    /// The provider has not reported the initial state yet.
    #[default]
    Pending,
    /// Nobody is signed in.
    Anonymous,
    /// A user is signed in and owns the cart.
    Authenticated(Identity),
}

impl SessionState {
    /// The signed-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Pending | Self::Anonymous => None,
        }
    }

    /// The signed-in user's ID, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.identity().map(|i| &i.user_id)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Field names of a `users/{uid}` profile document.
pub mod profile {
    pub const EMAIL: &str = "email";
    pub const NAME: &str = "name";
    pub const CART: &str = "cart";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shopfront_core::Email;

    #[test]
    fn test_default_is_pending() {
        let state = SessionState::default();
        assert!(state.is_pending());
        assert!(state.identity().is_none());
    }

    #[test]
    fn test_authenticated_exposes_identity() {
        let identity = Identity::new(
            UserId::new("u1"),
            Email::parse("user@example.com").unwrap(),
            "Demo User",
        );
        let state = SessionState::Authenticated(identity);
        assert!(state.is_authenticated());
        assert_eq!(state.user_id().map(UserId::as_str), Some("u1"));
    }
}
