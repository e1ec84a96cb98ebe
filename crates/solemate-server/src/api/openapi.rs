//! OpenAPI specification for the SoleMate API.

use axum::Json;
use solemate_core::{
    BatteryLevel, ContactKind, DetectedObject, DeviceStatus, Direction, EmergencyAlert,
    EmergencyContact, Flow, Notice, Principal, RadioStatus, Risk, Route, Screen, SessionState,
    SettingKey, Settings, SignInMethod, SignUpForm, SignalStrength,
};
use utoipa::OpenApi;

use super::auth::{AccountResponse, OutcomeKind, SignInRequest};
use super::detection::{DetectionHistoryResponse, DetectionResponse};
use super::devices::{DeviceResponse, DevicesResponse, ScanDevicesResponse};
use super::emergency::{AlertResponse, CallResponse, ContactsResponse};
use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::navigation::{NavigationResponse, StartNavigationRequest};
use super::session::{DismissErrorResponse, SessionErrorBody, SessionResponse};
use super::settings::ToggleSettingResponse;

/// Serve the OpenAPI specification as JSON at `/api/openapi.json`.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// OpenAPI document for the SoleMate host.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SoleMate API",
        version = "0.1.0",
        description = r#"
# SoleMate API

Headless host for the SoleMate smart-shoe companion.

## Session gating

The server subscribes to the identity provider once at startup. Every
provider notification updates the published session, and the navigation
gate derives the flow from it:

- `loading` until the provider answers
- `unauthenticated` (login, sign-up) when nobody is signed in or an error is pending
- `authenticated` (navigate, device, detection, emergency, settings) otherwise

Account endpoints never change the flow directly; the provider's
notification does. Device, detection, navigation, emergency and settings
endpoints answer `401` unless the gate is on the authenticated flow.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local SoleMate server")
    ),
    tags(
        (name = "system", description = "Health checks"),
        (name = "session", description = "The gated session and its flow"),
        (name = "auth", description = "Sign-in, sign-up and sign-out"),
        (name = "devices", description = "Smart shoe discovery and pairing"),
        (name = "detection", description = "Obstacle detection"),
        (name = "navigation", description = "Turn-by-turn guidance"),
        (name = "emergency", description = "Emergency contacts and alerts"),
        (name = "settings", description = "App settings toggles")
    ),
    paths(
        super::health::health_check,
        super::session::get_session,
        super::session::dismiss_error,
        super::auth::sign_in,
        super::auth::sign_in_with_google,
        super::auth::sign_up,
        super::auth::sign_up_with_google,
        super::auth::sign_out,
        super::devices::list_devices,
        super::devices::scan_devices,
        super::devices::connect_device,
        super::devices::disconnect_device,
        super::devices::refresh_devices,
        super::devices::enable_bluetooth,
        super::devices::request_permission,
        super::detection::run_detection,
        super::detection::stop_detection,
        super::detection::get_detection_history,
        super::detection::clear_detection_history,
        super::navigation::get_navigation,
        super::navigation::start_navigation,
        super::navigation::stop_navigation,
        super::emergency::list_contacts,
        super::emergency::send_alert,
        super::emergency::call_contact,
        super::settings::get_settings,
        super::settings::toggle_setting,
        super::settings::reset_settings,
    ),
    components(
        schemas(
            // Error types
            ErrorResponse,
            // Health types
            HealthResponse,
            // Session types
            SessionResponse,
            SessionErrorBody,
            DismissErrorResponse,
            SessionState,
            Flow,
            Screen,
            Principal,
            SignInMethod,
            // Account types
            SignInRequest,
            SignUpForm,
            AccountResponse,
            OutcomeKind,
            Notice,
            // Device types
            DeviceResponse,
            DevicesResponse,
            ScanDevicesResponse,
            DeviceStatus,
            SignalStrength,
            BatteryLevel,
            RadioStatus,
            // Detection types
            DetectedObject,
            Direction,
            Risk,
            DetectionResponse,
            DetectionHistoryResponse,
            // Navigation types
            Route,
            StartNavigationRequest,
            NavigationResponse,
            // Emergency types
            ContactKind,
            EmergencyContact,
            EmergencyAlert,
            ContactsResponse,
            AlertResponse,
            CallResponse,
            // Settings types
            Settings,
            SettingKey,
            ToggleSettingResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "SoleMate API");
        assert!(spec.paths.paths.contains_key("/api/session"));
        assert!(spec.paths.paths.contains_key("/api/devices/{id}/connect"));
        assert!(spec.paths.paths.contains_key("/api/devices/enable"));
        assert!(spec.paths.paths.contains_key("/api/navigation/start"));
        assert!(spec.paths.paths.contains_key("/api/emergency/contacts/{id}/call"));
        assert!(spec.paths.paths.contains_key("/api/auth/sign-up/google"));
    }

    #[test]
    fn test_openapi_json_serialization() {
        let json = ApiDoc::openapi().to_pretty_json().unwrap();
        assert!(json.contains("\"openapi\":"));
        assert!(json.contains("\"SoleMate API\""));
    }
}
