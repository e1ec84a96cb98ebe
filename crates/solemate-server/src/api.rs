//! HTTP API routes and handlers.
//!
//! Endpoints are grouped by the screen they serve:
//! - `health` - Service health checks
//! - `session` - The gated session and error acknowledgement
//! - `auth` - Login and sign-up screen actions
//! - `devices` - Smart shoe pairing
//! - `detection` - Obstacle detection
//! - `navigation` - Turn-by-turn guidance
//! - `emergency` - Emergency contacts and alerts
//! - `settings` - Settings panel toggles
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub mod auth;
pub mod detection;
pub mod devices;
pub mod emergency;
pub mod error;
pub mod health;
pub mod navigation;
pub mod openapi;
pub mod session;
pub mod settings;

pub use error::{ApiError, ApiResult, ErrorResponse};

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                      - Health check
/// /api
/// ├── /session                 - Gated session, dismiss error
/// ├── /auth                    - Sign-in, sign-up (password or Google), sign-out
/// ├── /devices                 - List, scan, connect, disconnect, refresh, radio
/// ├── /detection               - Run, stop, history
/// ├── /navigation              - Current route, start, stop
/// ├── /emergency               - Contacts, alert, call
/// ├── /settings                - Get, toggle, reset
/// └── /openapi.json            - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(session::router())
                .merge(auth::router())
                .merge(devices::router())
                .merge(detection::router())
                .merge(navigation::router())
                .merge(emergency::router())
                .merge(settings::router())
                .route("/openapi.json", get(openapi::get_openapi_spec)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
