//! Settings API endpoints.
//!
//! Every change is written to `settings.json` before the response is sent.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use solemate_core::{SettingKey, Settings};
use tracing::info;
use utoipa::ToSchema;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::api::session::require_authenticated;
use crate::state::SharedState;

/// Result of flipping one toggle.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "key": "dark_mode",
    "enabled": true,
    "settings": {
        "notifications": true,
        "vibration": true,
        "voice_guidance": true,
        "auto_connect": false,
        "location_sharing": true,
        "emergency_alerts": true,
        "dark_mode": true,
        "high_contrast": false
    }
}))]
pub struct ToggleSettingResponse {
    /// The toggle that changed.
    pub key: SettingKey,

    /// Its new value.
    pub enabled: bool,

    /// All settings after the change.
    pub settings: Settings,
}

/// Creates the settings router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings/{key}/toggle", put(toggle_setting))
        .route("/settings/reset", post(reset_settings))
}

/// Get current settings.
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "settings",
    operation_id = "getSettings",
    summary = "Get settings",
    responses(
        (status = 200, description = "Current settings", body = Settings),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn get_settings(State(state): State<SharedState>) -> ApiResult<Json<Settings>> {
    let state_guard = state.read().await;
    require_authenticated(&state_guard)?;
    Ok(Json(state_guard.settings))
}

/// Flip one toggle.
#[utoipa::path(
    put,
    path = "/api/settings/{key}/toggle",
    tag = "settings",
    operation_id = "toggleSetting",
    summary = "Toggle a setting",
    params(("key" = String, Path, description = "Setting name", example = "dark_mode")),
    responses(
        (status = 200, description = "Setting toggled", body = ToggleSettingResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Unknown setting", body = ErrorResponse)
    )
)]
pub async fn toggle_setting(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> ApiResult<Json<ToggleSettingResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;
    let key: SettingKey = key.parse()?;

    let mut settings = state_guard.settings;
    let enabled = settings.toggle(key);
    state_guard.settings_store.save(&settings)?;
    state_guard.settings = settings;

    info!(%key, enabled, "Setting toggled");
    Ok(Json(ToggleSettingResponse {
        key,
        enabled,
        settings,
    }))
}

/// Restore the default settings.
#[utoipa::path(
    post,
    path = "/api/settings/reset",
    tag = "settings",
    operation_id = "resetSettings",
    summary = "Reset settings",
    responses(
        (status = 200, description = "Defaults restored", body = Settings),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn reset_settings(State(state): State<SharedState>) -> ApiResult<Json<Settings>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;

    let mut settings = state_guard.settings;
    settings.reset();
    state_guard.settings_store.save(&settings)?;
    state_guard.settings = settings;

    info!("Settings reset to defaults");
    Ok(Json(settings))
}
