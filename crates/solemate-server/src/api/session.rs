//! Session API endpoints.
//!
//! Read-only view of what the session watcher published and which flow the
//! navigation gate selects for it. The only mutation is acknowledging a
//! surfaced provider error.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use solemate_core::{AuthError, Flow, Principal, Screen, Session, SessionState};
use tracing::info;
use utoipa::ToSchema;

use crate::api::error::{ApiError, ApiResult};
use crate::state::{AppState, SharedState};

// ============================================================================
// Request/Response Types
// ============================================================================

/// A provider error awaiting acknowledgement.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionErrorBody {
    /// Stable error code.
    #[schema(example = "network-failed")]
    pub code: String,

    /// Message to show the user.
    #[schema(example = "Network error. Please check your internet connection.")]
    pub message: String,

    /// Whether retrying may succeed.
    pub retryable: bool,

    /// Whether the host itself is misconfigured, so no retry will help.
    pub fatal: bool,
}

impl From<&AuthError> for SessionErrorBody {
    fn from(err: &AuthError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
            fatal: err.is_fatal(),
        }
    }
}

/// The current session and the flow selected for it.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "state": "authenticated",
    "flow": "authenticated",
    "screens": ["navigate", "device", "detection", "emergency", "settings"],
    "initial_screen": "navigate",
    "principal": {
        "uid": "4f0c1a7e-0c55-4c7b-9d0e-3b8f5e0d9a11",
        "email": "a@b.com",
        "display_name": "Ada",
        "photo_url": null,
        "email_verified": false,
        "sign_in_method": "password"
    },
    "error": null
}))]
pub struct SessionResponse {
    /// Effective session state.
    pub state: SessionState,

    /// Flow the gate mounts.
    pub flow: Flow,

    /// Screens reachable in that flow.
    pub screens: Vec<Screen>,

    /// Screen shown when the flow is mounted.
    pub initial_screen: Screen,

    /// The signed-in principal, present only on the authenticated flow.
    #[schema(nullable)]
    pub principal: Option<Principal>,

    /// Error to acknowledge, if any.
    #[schema(nullable)]
    pub error: Option<SessionErrorBody>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        let flow = Flow::for_session(session);
        Self {
            state: session.state(),
            flow,
            screens: flow.screens().to_vec(),
            initial_screen: flow.initial_screen(),
            principal: session.principal().cloned(),
            error: session.error().map(SessionErrorBody::from),
        }
    }
}

/// Result of acknowledging an error.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DismissErrorResponse {
    /// Whether there was an error to clear.
    pub dismissed: bool,

    /// The session after dismissal.
    pub session: SessionResponse,
}

// ============================================================================
// Router
// ============================================================================

/// Creates the session router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/dismiss-error", post(dismiss_error))
}

/// Fails unless the gate currently selects the authenticated flow.
pub(crate) fn require_authenticated(state: &AppState) -> ApiResult<()> {
    if state.gate.current() == Flow::Authenticated {
        Ok(())
    } else {
        Err(ApiError::not_authenticated())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the current session.
#[utoipa::path(
    get,
    path = "/api/session",
    tag = "session",
    operation_id = "getSession",
    summary = "Get the gated session",
    description = "Returns the latest session published by the session watcher \
        together with the flow and screens the navigation gate selects. While \
        the provider has not answered yet the flow is `loading`.",
    responses(
        (status = 200, description = "Current session", body = SessionResponse)
    )
)]
pub async fn get_session(State(state): State<SharedState>) -> Json<SessionResponse> {
    let state_guard = state.read().await;
    Json(SessionResponse::from(&state_guard.watcher.session()))
}

/// Acknowledge a surfaced provider error.
#[utoipa::path(
    post,
    path = "/api/session/dismiss-error",
    tag = "session",
    operation_id = "dismissSessionError",
    summary = "Dismiss the session error",
    description = "Clears the error shown to the user. The session stays on \
        the unauthenticated flow; the principal is not restored.",
    responses(
        (status = 200, description = "Error acknowledged", body = DismissErrorResponse)
    )
)]
pub async fn dismiss_error(State(state): State<SharedState>) -> Json<DismissErrorResponse> {
    let state_guard = state.read().await;
    let dismissed = state_guard.watcher.dismiss_error();
    if dismissed {
        info!("Session error acknowledged");
    }

    Json(DismissErrorResponse {
        dismissed,
        session: SessionResponse::from(&state_guard.watcher.session()),
    })
}
