//! Account API endpoints for the login and sign-up screens.
//!
//! These handlers never move the session themselves. A successful action
//! makes the identity provider notify the session watcher, and the gate
//! follows from there.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use solemate_core::{AccountAction, AccountOutcome, Notice, Principal, SignUpForm};
use utoipa::ToSchema;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::state::SharedState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Email and password sign-in request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "email": "a@b.com",
    "password": "hunter22"
}))]
pub struct SignInRequest {
    /// Account email.
    #[schema(example = "a@b.com")]
    pub email: String,

    /// Account password.
    #[schema(example = "hunter22")]
    pub password: String,
}

/// What an account action achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// An existing account signed in.
    SignedIn,
    /// A new account was created and signed in.
    Created,
    /// The principal signed out.
    SignedOut,
    /// The interactive flow was closed; nothing to show.
    Cancelled,
}

/// Account action response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "outcome": "created",
    "principal": {
        "uid": "4f0c1a7e-0c55-4c7b-9d0e-3b8f5e0d9a11",
        "email": "a@b.com",
        "display_name": "Ada",
        "photo_url": null,
        "email_verified": false,
        "sign_in_method": "password"
    },
    "notice": {
        "title": "Welcome to SoleMate!",
        "message": "Your account has been created successfully!"
    }
}))]
pub struct AccountResponse {
    /// What happened.
    pub outcome: OutcomeKind,

    /// The principal that signed in, for sign-in and sign-up.
    #[schema(nullable)]
    pub principal: Option<Principal>,

    /// Notification to show, if any.
    #[schema(nullable)]
    pub notice: Option<Notice>,
}

impl From<AccountOutcome> for AccountResponse {
    fn from(outcome: AccountOutcome) -> Self {
        let notice = outcome.notice();
        let principal = outcome.principal().cloned();
        let kind = match outcome {
            AccountOutcome::SignedIn(_) => OutcomeKind::SignedIn,
            AccountOutcome::Created(_) => OutcomeKind::Created,
            AccountOutcome::SignedOut => OutcomeKind::SignedOut,
            AccountOutcome::Cancelled => OutcomeKind::Cancelled,
        };
        Self {
            outcome: kind,
            principal,
            notice,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the account router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-in/google", post(sign_in_with_google))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-up/google", post(sign_up_with_google))
        .route("/auth/sign-out", post(sign_out))
}

// ============================================================================
// Handlers
// ============================================================================

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    tag = "auth",
    operation_id = "signIn",
    summary = "Sign in with email and password",
    description = "Validates the input, then signs in with the identity \
        provider. On success the first sign-in creates the profile document; \
        later ones refresh its last login time. Failures carry a `notice` in \
        `details` for the login screen.",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AccountResponse),
        (status = 400, description = "Missing or malformed input", body = ErrorResponse),
        (status = 401, description = "Unknown account or wrong password", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = ErrorResponse),
        (status = 503, description = "Identity provider unreachable", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<SharedState>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let accounts = state.read().await.accounts.clone();
    let outcome = accounts.sign_in(&request.email, &request.password).await?;
    Ok(Json(outcome.into()))
}

/// Sign in with Google.
#[utoipa::path(
    post,
    path = "/api/auth/sign-in/google",
    tag = "auth",
    operation_id = "signInWithGoogle",
    summary = "Sign in with Google",
    description = "Runs the interactive Google flow. If the user closes it the \
        outcome is `cancelled` and no notice is shown.",
    responses(
        (status = 200, description = "Signed in or cancelled", body = AccountResponse),
        (status = 503, description = "Identity provider unreachable", body = ErrorResponse)
    )
)]
pub async fn sign_in_with_google(
    State(state): State<SharedState>,
) -> ApiResult<Json<AccountResponse>> {
    let accounts = state.read().await.accounts.clone();
    let outcome = accounts.sign_in_with_google(AccountAction::SignIn).await?;
    Ok(Json(outcome.into()))
}

/// Continue with Google from the sign-up screen.
#[utoipa::path(
    post,
    path = "/api/auth/sign-up/google",
    tag = "auth",
    operation_id = "signUpWithGoogle",
    summary = "Sign up with Google",
    description = "Same flow as Google sign-in; failures carry a `Sign-up \
        Error` notice. A first login creates the profile document.",
    responses(
        (status = 200, description = "Signed in or cancelled", body = AccountResponse),
        (status = 503, description = "Identity provider unreachable", body = ErrorResponse)
    )
)]
pub async fn sign_up_with_google(
    State(state): State<SharedState>,
) -> ApiResult<Json<AccountResponse>> {
    let accounts = state.read().await.accounts.clone();
    let outcome = accounts.sign_in_with_google(AccountAction::SignUp).await?;
    Ok(Json(outcome.into()))
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    tag = "auth",
    operation_id = "signUp",
    summary = "Create an account",
    description = "Validates the form (all fields required, matching \
        passwords, at least 6 characters), creates the account and writes the \
        profile document.",
    request_body = SignUpForm,
    responses(
        (status = 200, description = "Account created", body = AccountResponse),
        (status = 400, description = "Form rejected", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn sign_up(
    State(state): State<SharedState>,
    Json(form): Json<SignUpForm>,
) -> ApiResult<Json<AccountResponse>> {
    let accounts = state.read().await.accounts.clone();
    let outcome = accounts.sign_up(&form).await?;
    Ok(Json(outcome.into()))
}

/// Sign out.
#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    tag = "auth",
    operation_id = "signOut",
    summary = "Sign out",
    responses(
        (status = 200, description = "Signed out", body = AccountResponse),
        (status = 503, description = "Identity provider unreachable", body = ErrorResponse)
    )
)]
pub async fn sign_out(State(state): State<SharedState>) -> ApiResult<Json<AccountResponse>> {
    let accounts = state.read().await.accounts.clone();
    let outcome = accounts.sign_out().await?;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_request_deserialization() {
        let json = r#"{"email": "a@b.com", "password": "hunter22"}"#;
        let request: SignInRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.email, "a@b.com");
    }

    #[test]
    fn test_cancelled_outcome_has_no_notice() {
        let response = AccountResponse::from(AccountOutcome::Cancelled);
        assert_eq!(response.outcome, OutcomeKind::Cancelled);
        assert!(response.notice.is_none());
        assert!(response.principal.is_none());
    }

    #[test]
    fn test_signed_out_outcome_serialization() {
        let json = serde_json::to_value(AccountResponse::from(AccountOutcome::SignedOut)).unwrap();
        assert_eq!(json["outcome"], "signed_out");
    }
}
