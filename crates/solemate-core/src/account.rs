//! Account flows: sign-in, federated sign-in, sign-up and sign-out.
//!
//! Inputs are validated before the identity provider sees them. Provider
//! failures are caught here and turned into a dismissible [`Notice`]; they
//! never reach the navigation gate. Navigation itself is driven only by the
//! session watcher reacting to the provider's notifications.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::identity::{AuthError, IdentityProvider, NewAccount, Principal};
use crate::profile::{ProfileDocument, ProfileStore};
use crate::provider::MIN_PASSWORD_LENGTH;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email regex is valid"));

/// Returns `true` if `email` looks like an email address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

// ============================================================================
// Notices
// ============================================================================

/// A dismissible, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    /// Short heading.
    #[schema(example = "Authentication Error")]
    pub title: String,
    /// Body text.
    #[schema(example = "Incorrect password. Please try again.")]
    pub message: String,
}

impl Notice {
    fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Input rejected before contacting the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Sign-in without email or password.
    #[error("Please fill in all fields to continue")]
    MissingCredentials,
    /// Sign-up without a name.
    #[error("Please enter your full name")]
    MissingName,
    /// Sign-up without an email.
    #[error("Please enter your email address")]
    MissingEmail,
    /// Sign-up without a password.
    #[error("Please enter a password")]
    MissingPassword,
    /// Sign-up without the password confirmation.
    #[error("Please confirm your password")]
    MissingConfirmation,
    /// Email does not look like an address.
    #[error("Please enter a valid email address")]
    InvalidEmail,
    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
    /// Password shorter than the minimum.
    #[error("Password must be at least {0} characters long")]
    PasswordTooShort(usize),
}

impl ValidationError {
    /// Notice heading for this problem.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::MissingCredentials
            | Self::MissingName
            | Self::MissingEmail
            | Self::MissingPassword
            | Self::MissingConfirmation => "Missing Information",
            Self::InvalidEmail => "Invalid Email",
            Self::PasswordMismatch => "Password Mismatch",
            Self::PasswordTooShort(_) => "Weak Password",
        }
    }
}

/// Which account action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    /// Password or Google sign-in.
    SignIn,
    /// Account creation.
    SignUp,
    /// Sign-out.
    SignOut,
}

impl fmt::Display for AccountAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SignIn => "Sign-in",
            Self::SignUp => "Sign-up",
            Self::SignOut => "Sign-out",
        })
    }
}

/// A failed account action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// The input was rejected locally.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The identity provider rejected the action.
    #[error("{action} failed: {source}")]
    Auth {
        /// The failed action.
        action: AccountAction,
        /// Provider error.
        source: AuthError,
    },
}

/// Result type for account actions.
pub type AccountResult<T> = std::result::Result<T, AccountError>;

impl AccountError {
    /// The provider error, if the provider was reached.
    #[must_use]
    pub const fn auth_error(&self) -> Option<&AuthError> {
        match self {
            Self::Invalid(_) => None,
            Self::Auth { source, .. } => Some(source),
        }
    }

    /// Returns `true` if repeating the same action may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Invalid(_) => false,
            Self::Auth { source, .. } => source.is_retryable(),
        }
    }

    /// The notification shown to the user.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Invalid(err) => Notice::new(err.title(), err.to_string()),
            Self::Auth { action, source } => {
                let title = match action {
                    AccountAction::SignIn => "Authentication Error",
                    AccountAction::SignUp => "Sign-up Error",
                    AccountAction::SignOut => "Sign-out Error",
                };
                let message = match source {
                    AuthError::Provider { message, .. } if message.trim().is_empty() => {
                        "An unexpected error occurred.".to_string()
                    }
                    other => other.to_string(),
                };
                Notice::new(title, message)
            }
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// What an account action achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// An existing account signed in.
    SignedIn(Principal),
    /// A new account was created and signed in.
    Created(Principal),
    /// The current principal signed out.
    SignedOut,
    /// The user closed the interactive flow. Not an error; nothing is shown.
    Cancelled,
}

impl AccountOutcome {
    /// The success notification, if this outcome shows one.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Created(_) => Some(Notice::new(
                "Welcome to SoleMate!",
                "Your account has been created successfully!",
            )),
            Self::SignedOut => Some(Notice::new(
                "Signed Out",
                "You have been signed out successfully.",
            )),
            Self::SignedIn(_) | Self::Cancelled => None,
        }
    }

    /// The principal the action signed in, if any.
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::SignedIn(p) | Self::Created(p) => Some(p),
            Self::SignedOut | Self::Cancelled => None,
        }
    }
}

/// Sign-up form input.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SignUpForm {
    /// Full name.
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// Email address.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}

impl SignUpForm {
    /// Checks the form in the order the fields are shown.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        if self.confirm_password.is_empty() {
            return Err(ValidationError::MissingConfirmation);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }
        Ok(())
    }
}

/// Checks sign-in input.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

// ============================================================================
// Service
// ============================================================================

/// Runs account actions against the identity provider and profile store.
#[derive(Clone)]
pub struct AccountService {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl AccountService {
    /// Creates a service over the given collaborators.
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { provider, profiles }
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or the provider's error.
    pub async fn sign_in(&self, email: &str, password: &str) -> AccountResult<AccountOutcome> {
        validate_sign_in(email, password)?;
        info!(email = email.trim(), "Attempting password sign-in");

        match self
            .provider
            .sign_in_with_password(email.trim(), password)
            .await
        {
            Ok(principal) => {
                self.record_login(&principal).await;
                Ok(AccountOutcome::SignedIn(principal))
            }
            Err(err) => failure(AccountAction::SignIn, err),
        }
    }

    /// Runs the interactive Google flow from the login or sign-up screen.
    ///
    /// `action` names the screen it was started from and picks the failure
    /// notice title. The first successful sign-in creates the profile
    /// document with default preferences; later ones only refresh
    /// `last_login_at`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error. A closed sign-in window is
    /// [`AccountOutcome::Cancelled`], not an error.
    pub async fn sign_in_with_google(
        &self,
        action: AccountAction,
    ) -> AccountResult<AccountOutcome> {
        match self.provider.sign_in_with_google().await {
            Ok(principal) => {
                self.record_login(&principal).await;
                Ok(AccountOutcome::SignedIn(principal))
            }
            Err(err) => failure(action, err),
        }
    }

    /// Creates an account and its profile document.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or the provider's error.
    pub async fn sign_up(&self, form: &SignUpForm) -> AccountResult<AccountOutcome> {
        form.validate()?;
        info!(email = form.email.trim(), "Attempting sign-up");

        let account = NewAccount {
            display_name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        match self.provider.create_account(account).await {
            Ok(principal) => {
                let profile = ProfileDocument::for_new_principal(&principal, Utc::now());
                if let Err(e) = self.profiles.write(&principal.uid, &profile).await {
                    error!(uid = %principal.uid, error = %e, "Failed to create profile document");
                }
                Ok(AccountOutcome::Created(principal))
            }
            Err(err) => failure(AccountAction::SignUp, err),
        }
    }

    /// Signs the current principal out.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn sign_out(&self) -> AccountResult<AccountOutcome> {
        match self.provider.sign_out().await {
            Ok(()) => Ok(AccountOutcome::SignedOut),
            Err(err) => failure(AccountAction::SignOut, err),
        }
    }

    /// Creates the profile on first login, otherwise refreshes `last_login_at`.
    /// Store failures are logged and never fail the sign-in.
    async fn record_login(&self, principal: &Principal) {
        let now = Utc::now();
        let profile = match self.profiles.read(&principal.uid).await {
            Ok(Some(mut profile)) => {
                profile.last_login_at = now;
                profile
            }
            Ok(None) => {
                info!(uid = %principal.uid, "Creating profile document on first login");
                ProfileDocument::for_new_principal(principal, now)
            }
            Err(e) => {
                warn!(uid = %principal.uid, error = %e, "Failed to read profile document");
                return;
            }
        };
        if let Err(e) = self.profiles.write(&principal.uid, &profile).await {
            warn!(uid = %principal.uid, error = %e, "Failed to update last login timestamp");
        }
    }
}

fn failure(action: AccountAction, err: AuthError) -> AccountResult<AccountOutcome> {
    if err.is_silent() {
        info!(%action, "Interactive flow cancelled by user");
        return Ok(AccountOutcome::Cancelled);
    }
    warn!(%action, code = err.code(), error = %err, "Account action failed");
    Err(AccountError::Auth {
        action,
        source: err,
    })
}
