//! Authenticated identity handed out by auth providers.

use serde::{Deserialize, Serialize};

use crate::{Email, UserId};

/// Who is signed in.
///
/// Minimal data the session gate needs to own a cart: the provider's user
/// key, the sign-in email, and a display name for the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user ID; also the key of the profile document.
    pub user_id: UserId,
    /// Sign-in email address.
    pub email: Email,
    /// Name shown in the UI.
    pub display_name: String,
}

impl Identity {
    /// Create an identity, falling back to the email's local part when the
    /// display name is blank.
    #[must_use]
    pub fn new(user_id: UserId, email: Email, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let display_name = if display_name.trim().is_empty() {
            email.local_part().to_owned()
        } else {
            display_name.trim().to_owned()
        };

        Self {
            user_id,
            email,
            display_name,
        }
    }
}
