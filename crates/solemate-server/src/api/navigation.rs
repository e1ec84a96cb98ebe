//! Navigation API endpoints for the navigate screen.
//!
//! Guidance needs a connected shoe; stopping does not.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use solemate_core::Route;
use utoipa::ToSchema;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::api::session::require_authenticated;
use crate::state::SharedState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to start guidance.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StartNavigationRequest {
    /// Where to go.
    #[schema(example = "Central Library")]
    pub destination: String,
}

/// Navigation state for the navigate screen.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "current_location": "123 Main Street, Downtown",
    "navigating": true,
    "route": {
        "origin": "123 Main Street, Downtown",
        "destination": "Central Library",
        "directions": ["Head north on Main Street for 100 meters"],
        "started_at": "2025-01-15T03:30:00Z"
    }
}))]
pub struct NavigationResponse {
    /// Where the user is now.
    pub current_location: String,

    /// Whether guidance is running.
    pub navigating: bool,

    /// The active route, or on stop the route that just ended.
    #[schema(nullable)]
    pub route: Option<Route>,
}

// ============================================================================
// Router
// ============================================================================

/// Creates the navigation router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/navigation", get(get_navigation))
        .route("/navigation/start", post(start_navigation))
        .route("/navigation/stop", post(stop_navigation))
}

// ============================================================================
// Handlers
// ============================================================================

/// Get navigation state.
#[utoipa::path(
    get,
    path = "/api/navigation",
    tag = "navigation",
    operation_id = "getNavigation",
    summary = "Get navigation state",
    responses(
        (status = 200, description = "Navigation state", body = NavigationResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn get_navigation(
    State(state): State<SharedState>,
) -> ApiResult<Json<NavigationResponse>> {
    let state_guard = state.read().await;
    require_authenticated(&state_guard)?;

    let navigation = &state_guard.navigation;
    Ok(Json(NavigationResponse {
        current_location: navigation.current_location(),
        navigating: navigation.active().is_some(),
        route: navigation.active().cloned(),
    }))
}

/// Start guidance.
#[utoipa::path(
    post,
    path = "/api/navigation/start",
    tag = "navigation",
    operation_id = "startNavigation",
    summary = "Start navigation",
    description = "Plans a route from the current location and starts \
        guidance, replacing any active route.",
    request_body = StartNavigationRequest,
    responses(
        (status = 200, description = "Navigation started", body = NavigationResponse),
        (status = 400, description = "No destination", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 409, description = "No device connected", body = ErrorResponse)
    )
)]
pub async fn start_navigation(
    State(state): State<SharedState>,
    Json(request): Json<StartNavigationRequest>,
) -> ApiResult<Json<NavigationResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;

    let connected = state_guard.devices.connected().is_some();
    let route = state_guard
        .navigation
        .start(&request.destination, connected)
        .await?
        .clone();

    Ok(Json(NavigationResponse {
        current_location: state_guard.navigation.current_location(),
        navigating: true,
        route: Some(route),
    }))
}

/// Stop guidance.
#[utoipa::path(
    post,
    path = "/api/navigation/stop",
    tag = "navigation",
    operation_id = "stopNavigation",
    summary = "Stop navigation",
    responses(
        (status = 200, description = "Navigation stopped", body = NavigationResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 409, description = "Navigation not running", body = ErrorResponse)
    )
)]
pub async fn stop_navigation(
    State(state): State<SharedState>,
) -> ApiResult<Json<NavigationResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;

    let route = state_guard.navigation.stop()?;
    Ok(Json(NavigationResponse {
        current_location: state_guard.navigation.current_location(),
        navigating: false,
        route: Some(route),
    }))
}
