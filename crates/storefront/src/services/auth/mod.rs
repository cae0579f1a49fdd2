//! Authentication service.
//!
//! The shop consumes an external auth provider through [`AuthProvider`]:
//! sign in, sign up, sign out, and a subscription that reports the signed-in
//! identity. Two providers exist:
//!
//! - [`MemoryAuth`] - accounts in a map, seeded with a demo user
//! - [`PgAuth`] - accounts in the `auth_users` table
//!
//! Both keep the process's current identity in a [`Notifier`], which fans
//! state changes out to subscribers as `Option<Identity>` (`None` means
//! signed out).

mod error;
mod memory;
mod password;
mod postgres;

pub use error::AuthError;
pub use memory::{DEMO_EMAIL, DEMO_NAME, DEMO_PASSWORD, MemoryAuth};
pub use password::PasswordHashing;
pub use postgres::PgAuth;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use shopfront_core::{Email, Identity};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum display name length.
pub const MIN_NAME_LENGTH: usize = 2;

/// Receiving end of an auth-state subscription.
pub type AuthEvents = mpsc::UnboundedReceiver<Option<Identity>>;

/// External authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Short provider name for logs.
    fn provider_tag(&self) -> &'static str;

    /// Verify credentials and make `email` the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, AuthError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailInUse` if the email is already registered.
    async fn sign_up(&self, email: &Email, name: &str, password: &str)
    -> Result<Identity, AuthError>;

    /// Sign the current identity out. Signing out while signed out is a no-op.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribe to auth-state changes.
    ///
    /// The current state is delivered immediately, then one message per
    /// transition.
    async fn subscribe(&self) -> AuthEvents;
}

/// Current identity plus the subscribers to notify when it changes.
#[derive(Debug, Default)]
pub struct Notifier {
    inner: Mutex<NotifierState>,
}

#[derive(Debug, Default)]
struct NotifierState {
    current: Option<Identity>,
    subscribers: Vec<mpsc::UnboundedSender<Option<Identity>>>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and hand it the current state.
    pub async fn subscribe(&self) -> AuthEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.lock().await;
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(state.current.clone());
        state.subscribers.push(tx);
        rx
    }

    /// Record a new state and notify subscribers if it differs from the old.
    ///
    /// Subscribers whose receivers were dropped are forgotten.
    pub async fn publish(&self, next: Option<Identity>) {
        let mut state = self.inner.lock().await;
        if state.current == next {
            return;
        }

        state.current = next;
        let current = state.current.clone();
        state
            .subscribers
            .retain(|tx| tx.send(current.clone()).is_ok());
    }
}

// =============================================================================
// Form Validation
// =============================================================================

/// Validate sign-in form input.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword`.
pub fn validate_sign_in(email: &str, password: &str) -> Result<Email, AuthError> {
    let email = Email::parse(email)?;
    validate_password(password)?;
    Ok(email)
}

/// Validate sign-up form input, returning the parsed email and trimmed name.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail`, `AuthError::InvalidName` or
/// `AuthError::WeakPassword`.
pub fn validate_sign_up(
    email: &str,
    name: &str,
    password: &str,
) -> Result<(Email, String), AuthError> {
    let email = Email::parse(email)?;
    let name = validate_name(name)?;
    validate_password(password)?;
    Ok((email, name))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }

    Ok(name.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shopfront_core::UserId;

    fn identity(id: &str) -> Identity {
        Identity::new(
            UserId::new(id),
            Email::parse(&format!("{id}@shop.test")).unwrap(),
            "Tester",
        )
    }

    #[test]
    fn test_validate_sign_in() {
        assert!(validate_sign_in("user@example.com", "password123").is_ok());
        assert!(matches!(
            validate_sign_in("user.example.com", "password123"),
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_sign_in("user@example.com", "12345"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_sign_up() {
        let (email, name) = validate_sign_up(" New@Shop.test ", "  Al ", "secret1").unwrap();
        assert_eq!(email.as_str(), "new@shop.test");
        assert_eq!(name, "Al");

        assert!(matches!(
            validate_sign_up("new@shop.test", " A ", "secret1"),
            Err(AuthError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_state_first() {
        let notifier = Notifier::new();
        notifier.publish(Some(identity("u1"))).await;

        let mut rx = notifier.subscribe().await;
        assert_eq!(rx.recv().await.unwrap(), Some(identity("u1")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_only_on_transition() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe().await;
        assert_eq!(rx.recv().await.unwrap(), None);

        notifier.publish(None).await;
        notifier.publish(Some(identity("u1"))).await;
        notifier.publish(Some(identity("u1"))).await;
        notifier.publish(None).await;

        assert_eq!(rx.recv().await.unwrap(), Some(identity("u1")));
        assert_eq!(rx.recv().await.unwrap(), None);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let notifier = Notifier::new();
        drop(notifier.subscribe().await);
        notifier.publish(Some(identity("u1"))).await;
        assert!(notifier.inner.lock().await.subscribers.is_empty());
    }
}
