//! Identity provider capability.
//!
//! The identity provider is an external, managed authentication backend. The
//! application never constructs a [`Principal`] itself; it only reads what
//! the provider surfaces. Session changes arrive as [`SessionEvent`]s pushed
//! onto a channel that the provider hands out from [`IdentityProvider::subscribe`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use utoipa::ToSchema;

// ============================================================================
// Principal
// ============================================================================

/// How a principal authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignInMethod {
    /// Email and password.
    Password,
    /// Interactive Google sign-in.
    Google,
}

impl SignInMethod {
    /// Provider label stored on the profile document.
    #[must_use]
    pub const fn provider_label(self) -> &'static str {
        match self {
            Self::Password => "email",
            Self::Google => "google",
        }
    }
}

/// An authenticated identity, owned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Provider-assigned identifier.
    #[schema(example = "4f0c1a7e-0c55-4c7b-9d0e-3b8f5e0d9a11")]
    pub uid: String,

    /// Primary email address, if the provider exposes one.
    #[schema(example = "a@b.com")]
    pub email: Option<String>,

    /// Display name.
    pub display_name: Option<String>,

    /// Avatar URL.
    pub photo_url: Option<String>,

    /// Whether the provider has verified the email address.
    pub email_verified: bool,

    /// How the principal signed in.
    pub sign_in_method: SignInMethod,
}

// ============================================================================
// Errors
// ============================================================================

/// Provider-agnostic authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The provider could not be reached.
    #[error("Network error. Please check your internet connection.")]
    NetworkFailed,

    /// No account is registered for the given email.
    #[error("No account found with this email address.")]
    UnknownAccount,

    /// The password did not match.
    #[error("Incorrect password. Please try again.")]
    WrongPassword,

    /// The email address is malformed.
    #[error("Invalid email address format.")]
    InvalidEmail,

    /// Sign-up with an email that is already registered.
    #[error(
        "This email address is already registered. Please use a different email or sign in instead."
    )]
    EmailInUse,

    /// The provider rejected the password as too weak.
    #[error("Password is too weak. Please choose a stronger password.")]
    WeakPassword,

    /// Too many attempts in a short period.
    #[error("Too many failed attempts. Please try again later.")]
    RateLimited,

    /// The user closed an interactive sign-in flow.
    #[error("Sign-in was cancelled.")]
    Cancelled,

    /// The provider is not configured correctly or failed to initialise.
    #[error("Identity provider is misconfigured: {0}")]
    Misconfigured(String),

    /// Any other provider-reported failure.
    #[error("{message}")]
    Provider {
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },
}

/// Result type for identity operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Maps a provider error code (`auth/<code>` or bare `<code>`) to the taxonomy.
    #[must_use]
    pub fn from_provider_code(code: &str, message: &str) -> Self {
        let bare = code.strip_prefix("auth/").unwrap_or(code);
        match bare {
            "network-request-failed" => Self::NetworkFailed,
            "user-not-found" => Self::UnknownAccount,
            "wrong-password" | "invalid-credential" => Self::WrongPassword,
            "invalid-email" => Self::InvalidEmail,
            "email-already-in-use" => Self::EmailInUse,
            "weak-password" => Self::WeakPassword,
            "too-many-requests" => Self::RateLimited,
            "popup-closed-by-user" | "cancelled-popup-request" => Self::Cancelled,
            "invalid-api-key" | "app-not-authorized" | "operation-not-allowed" => {
                Self::Misconfigured(message.to_string())
            }
            _ => Self::Provider {
                code: bare.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::NetworkFailed => "network-failed",
            Self::UnknownAccount => "unknown-account",
            Self::WrongPassword => "wrong-password",
            Self::InvalidEmail => "invalid-email",
            Self::EmailInUse => "email-in-use",
            Self::WeakPassword => "weak-password",
            Self::RateLimited => "rate-limited",
            Self::Cancelled => "cancelled",
            Self::Misconfigured(_) => "misconfigured",
            Self::Provider { code, .. } => code,
        }
    }

    /// Returns `true` if repeating the same action may succeed.
    #[inline]
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkFailed)
    }

    /// Returns `true` for outcomes that are not shown to the user at all.
    #[inline]
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the error ends the current session attempt.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Misconfigured(_))
    }
}

impl Serialize for AuthError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// A session-change notification pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A principal is signed in.
    SignedIn(Principal),
    /// Nobody is signed in.
    SignedOut,
    /// The provider could not determine the session state.
    Failed(AuthError),
}

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A live listener registration.
///
/// Dropping the receiver does not unregister the listener; the owner must
/// call [`IdentityProvider::unsubscribe`] with [`Subscription::id`].
#[derive(Debug)]
pub struct Subscription {
    /// Handle to pass back to [`IdentityProvider::unsubscribe`].
    pub id: SubscriptionId,
    /// Notifications, in the order the provider emits them.
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

/// Credentials for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// The managed identity backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers a session-change listener.
    ///
    /// The provider delivers the current session state as the first event.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot register a listener at all,
    /// for example when it is misconfigured.
    fn subscribe(&self) -> AuthResult<Subscription>;

    /// Releases a listener registered with [`IdentityProvider::subscribe`].
    fn unsubscribe(&self, id: SubscriptionId);

    /// Signs in with email and password.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Principal>;

    /// Runs the interactive Google sign-in flow.
    async fn sign_in_with_google(&self) -> AuthResult<Principal>;

    /// Creates an account and signs it in.
    async fn create_account(&self, account: NewAccount) -> AuthResult<Principal>;

    /// Signs the current principal out.
    async fn sign_out(&self) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_codes_map_to_taxonomy() {
        assert_eq!(
            AuthError::from_provider_code("auth/network-request-failed", ""),
            AuthError::NetworkFailed
        );
        assert_eq!(
            AuthError::from_provider_code("auth/too-many-requests", ""),
            AuthError::RateLimited
        );
        assert_eq!(
            AuthError::from_provider_code("popup-closed-by-user", ""),
            AuthError::Cancelled
        );
        assert_eq!(
            AuthError::from_provider_code("auth/invalid-api-key", "bad key"),
            AuthError::Misconfigured("bad key".into())
        );
    }

    #[test]
    fn test_unknown_code_keeps_provider_message() {
        let err = AuthError::from_provider_code("auth/quota-exceeded", "Quota exceeded");
        assert_eq!(err.code(), "quota-exceeded");
        assert_eq!(err.to_string(), "Quota exceeded");
    }

    #[test]
    fn test_error_classification() {
        assert!(AuthError::NetworkFailed.is_retryable());
        assert!(!AuthError::WrongPassword.is_retryable());
        assert!(!AuthError::RateLimited.is_retryable());
        assert!(AuthError::Cancelled.is_silent());
        assert!(AuthError::Misconfigured("x".into()).is_fatal());
    }

    #[test]
    fn test_error_serializes_as_code() {
        let json = serde_json::to_string(&AuthError::NetworkFailed).unwrap();
        assert_eq!(json, "\"network-failed\"");
    }

    #[test]
    fn test_provider_label() {
        assert_eq!(SignInMethod::Password.provider_label(), "email");
        assert_eq!(SignInMethod::Google.provider_label(), "google");
    }
}
