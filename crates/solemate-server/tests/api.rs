//! End-to-end tests driving the router the way the app's screens would.

use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use solemate_core::provider::GoogleIdentity;
use solemate_core::{AuthError, Config, Flow};
use solemate_server::api::create_router;
use solemate_server::state::{AppState, SharedState};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: SharedState,
    dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = Some(dir.path().to_path_buf());
        config.devices.scan_duration_secs = 1;
        customize(&mut config);

        let mut app_state = AppState::new(config).unwrap();
        app_state.watcher.activate().unwrap();
        let state = app_state.into_shared();
        let router = create_router(state.clone());

        Self { router, state, dir }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(Method::POST, uri, body).await
    }

    /// Waits until the gate selects `flow`.
    async fn wait_for_flow(&self, flow: Flow) {
        let mut gate = self.state.read().await.gate.clone();
        tokio::time::timeout(Duration::from_secs(2), async {
            while gate.current() != flow {
                if gate.changed().await.is_none() {
                    break;
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("gate never reached {flow:?}"));
        assert_eq!(gate.current(), flow);
    }

    async fn sign_up(&self, email: &str, password: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/auth/sign-up",
                Some(json!({
                    "name": "Ada Lovelace",
                    "email": email,
                    "password": password,
                    "confirm_password": password
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        self.wait_for_flow(Flow::Authenticated).await;
        body
    }

    async fn sign_out(&self) {
        let (status, _) = self.post("/api/auth/sign-out", None).await;
        assert_eq!(status, StatusCode::OK);
        self.wait_for_flow(Flow::Unauthenticated).await;
    }
}

// ============================================================================
// Session and gate
// ============================================================================

#[tokio::test]
async fn test_starts_on_unauthenticated_flow() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;

    let (status, body) = app.get("/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "unauthenticated");
    assert_eq!(body["screens"], json!(["login", "sign_up"]));
    assert_eq!(body["initial_screen"], "login");
    assert!(body["principal"].is_null());

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["watcher_active"], true);
}

#[tokio::test]
async fn test_authenticated_routes_require_sign_in() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;

    for (method, uri) in [
        (Method::GET, "/api/devices"),
        (Method::POST, "/api/devices/scan"),
        (Method::POST, "/api/devices/solemate-001/connect"),
        (Method::POST, "/api/detection/run"),
        (Method::GET, "/api/detection/history"),
        (Method::POST, "/api/devices/enable"),
        (Method::POST, "/api/navigation/stop"),
        (Method::GET, "/api/emergency/contacts"),
        (Method::POST, "/api/emergency/alert"),
        (Method::GET, "/api/settings"),
        (Method::PUT, "/api/settings/dark_mode/toggle"),
    ] {
        let (status, body) = app.send(method, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "not_authenticated");
    }
}

#[tokio::test]
async fn test_misconfigured_provider_fails_closed() {
    let app = TestApp::with_config(|config| config.identity.api_key = String::new()).await;

    let (_, body) = app.get("/api/session").await;
    assert_eq!(body["state"], "failed");
    assert_eq!(body["flow"], "unauthenticated");
    assert_eq!(body["error"]["code"], "misconfigured");
    assert_eq!(body["error"]["fatal"], true);

    let (status, body) = app.post("/api/session/dismiss-error", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dismissed"], true);
    assert_eq!(body["session"]["state"], "unauthenticated");
    assert!(body["session"]["error"].is_null());
}

#[tokio::test]
async fn test_provider_error_drops_principal() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;

    app.state
        .read()
        .await
        .provider
        .emit_failure(AuthError::NetworkFailed);
    app.wait_for_flow(Flow::Unauthenticated).await;

    let (_, body) = app.get("/api/session").await;
    assert_eq!(body["state"], "failed");
    assert!(body["principal"].is_null());
    assert_eq!(body["error"]["retryable"], true);

    let (status, _) = app.get("/api/devices").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivate_unsubscribes_once() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;

    let provider = app.state.read().await.provider.clone();
    assert_eq!(provider.listener_count(), 1);

    assert!(app.state.write().await.watcher.deactivate());
    assert!(!app.state.write().await.watcher.deactivate());
    assert_eq!(provider.listener_count(), 0);

    let (_, body) = app.get("/health").await;
    assert_eq!(body["watcher_active"], false);
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_sign_up_creates_profile_and_authenticates() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;

    let body = app.sign_up("ada@example.com", "secret123").await;
    assert_eq!(body["outcome"], "created");
    assert_eq!(body["notice"]["title"], "Welcome to SoleMate!");

    let uid = body["principal"]["uid"].as_str().unwrap().to_string();
    let profile_path = app.dir.path().join("users").join(format!("{uid}.json"));
    let profile: Value =
        serde_json::from_str(&std::fs::read_to_string(profile_path).unwrap()).unwrap();
    assert_eq!(profile["provider"], "email");
    assert_eq!(profile["display_name"], "Ada Lovelace");

    let (_, session) = app.get("/api/session").await;
    assert_eq!(session["flow"], "authenticated");
    assert_eq!(session["initial_screen"], "navigate");
    assert_eq!(session["principal"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_sign_up_validation_keeps_user_signed_out() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;

    let (status, body) = app
        .post(
            "/api/auth/sign-up",
            Some(json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": "secret123",
                "confirm_password": "secret124"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["notice"]["title"], "Password Mismatch");

    let (_, session) = app.get("/api/session").await;
    assert_eq!(session["flow"], "unauthenticated");
}

#[tokio::test]
async fn test_duplicate_sign_up_is_conflict() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;
    app.sign_out().await;

    let (status, body) = app
        .post(
            "/api/auth/sign-up",
            Some(json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": "secret123",
                "confirm_password": "secret123"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "auth_email_in_use");
    assert_eq!(body["details"]["notice"]["title"], "Sign-up Error");
}

#[tokio::test]
async fn test_password_sign_in() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;
    app.sign_out().await;

    let (status, body) = app
        .post(
            "/api/auth/sign-in",
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "auth_wrong_password");
    assert_eq!(body["details"]["notice"]["title"], "Authentication Error");

    let (status, body) = app
        .post(
            "/api/auth/sign-in",
            Some(json!({ "email": "ada@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "signed_in");
    app.wait_for_flow(Flow::Authenticated).await;
}

#[tokio::test]
async fn test_sign_in_missing_fields() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;

    let (status, body) = app
        .post(
            "/api/auth/sign-in",
            Some(json!({ "email": "", "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["notice"]["title"], "Missing Information");
}

#[tokio::test]
async fn test_google_sign_in() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;

    let (status, body) = app.post("/api/auth/sign-in/google", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "cancelled");
    assert!(body["notice"].is_null());

    app.state
        .read()
        .await
        .provider
        .set_google_identity(Some(GoogleIdentity {
            email: "grace@example.com".to_string(),
            display_name: Some("Grace Hopper".to_string()),
            photo_url: None,
        }));

    let (status, body) = app.post("/api/auth/sign-in/google", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "signed_in");
    app.wait_for_flow(Flow::Authenticated).await;

    let uid = body["principal"]["uid"].as_str().unwrap().to_string();
    let profile_path = app.dir.path().join("users").join(format!("{uid}.json"));
    let profile: Value =
        serde_json::from_str(&std::fs::read_to_string(profile_path).unwrap()).unwrap();
    assert_eq!(profile["provider"], "google");
    assert_eq!(profile["preferences"]["language"], "en");
}

#[tokio::test]
async fn test_google_failure_on_sign_up_screen() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.state.read().await.provider.set_network_available(false);

    let (status, body) = app.post("/api/auth/sign-up/google", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "auth_network_failed");
    assert_eq!(body["details"]["notice"]["title"], "Sign-up Error");
    assert_eq!(body["details"]["retryable"], true);

    let (_, body) = app.post("/api/auth/sign-in/google", None).await;
    assert_eq!(body["details"]["notice"]["title"], "Authentication Error");
}

// ============================================================================
// Devices and detection
// ============================================================================

#[tokio::test]
async fn test_scan_needs_radio_enabled_and_permission() {
    let app = TestApp::with_config(|config| {
        config.devices.bluetooth_enabled = false;
        config.devices.location_permitted = false;
    })
    .await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;

    let (status, body) = app.get("/api/devices").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["radio"]["enabled"], false);

    let (status, body) = app.post("/api/devices/scan", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "bluetooth_disabled");

    let (status, body) = app.post("/api/devices/enable", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], true);
    assert_eq!(body["permission_granted"], false);

    let (status, body) = app.post("/api/devices/scan", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "bluetooth_permission_denied");

    let (status, body) = app.post("/api/devices/permission", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permission_granted"], true);

    let (status, body) = app.post("/api/devices/scan", None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["devices"].as_array().unwrap().len(), 4);

    let (_, body) = app.get("/api/devices").await;
    assert_eq!(body["radio"], json!({ "enabled": true, "permission_granted": true }));
}

#[tokio::test]
async fn test_device_pairing_and_detection() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;

    let (status, body) = app.post("/api/detection/run", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "device_not_connected");

    let (status, body) = app.get("/api/devices").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["devices"].as_array().unwrap().len(), 3);
    assert!(body["connected"].is_null());

    let (status, _) = app.post("/api/devices/solemate-404/connect", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.post("/api/devices/solemate-002/connect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "connected");

    let (status, body) = app.post("/api/devices/solemate-001/connect", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body_list) = app.get("/api/devices").await;
    assert_eq!(body_list["connected"]["id"], body["id"]);
    let paired: Vec<_> = body_list["devices"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| d["paired"] == true)
        .collect();
    assert_eq!(paired.len(), 1);

    let (status, body) = app.post("/api/detection/run", None).await;
    assert_eq!(status, StatusCode::OK);
    let found = body["objects"].as_array().unwrap().len();
    assert!((1..=4).contains(&found));

    let (_, history) = app.get("/api/detection/history").await;
    assert_eq!(history["total"], found);

    let (status, body) = app.post("/api/detection/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["objects"].as_array().unwrap().is_empty());

    let (status, history) = app.send(Method::DELETE, "/api/detection/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["total"], 0);

    let (status, _) = app.post("/api/devices/disconnect", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.post("/api/devices/disconnect", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "device_not_connected");
}

#[tokio::test]
async fn test_scan_discovers_next_device() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;

    let (status, body) = app.post("/api/devices/scan", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scan_duration_secs"], 1);
    let devices = body["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 4);
    assert_eq!(devices[3]["id"], "solemate-004");

    let (status, body) = app.post("/api/devices/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    for device in body["devices"].as_array().unwrap() {
        let battery = device["battery_percent"].as_u64().unwrap();
        assert!((20..=100).contains(&battery));
    }
}

// ============================================================================
// Navigation and emergency
// ============================================================================

#[tokio::test]
async fn test_navigation_needs_destination_and_device() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;

    let (status, body) = app.get("/api/navigation").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["navigating"], false);
    assert_eq!(body["current_location"], "123 Main Street, Downtown");

    let (status, body) = app
        .post("/api/navigation/start", Some(json!({ "destination": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_destination");

    let (status, body) = app
        .post(
            "/api/navigation/start",
            Some(json!({ "destination": "Central Library" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "device_not_connected");

    let (status, _) = app.post("/api/devices/solemate-001/connect", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/api/navigation/start",
            Some(json!({ "destination": "Central Library" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["navigating"], true);
    assert_eq!(body["route"]["destination"], "Central Library");
    assert_eq!(body["route"]["directions"].as_array().unwrap().len(), 4);

    let (_, body) = app.get("/api/navigation").await;
    assert_eq!(body["navigating"], true);

    let (status, body) = app.post("/api/navigation/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["navigating"], false);
    assert_eq!(body["route"]["destination"], "Central Library");

    let (status, body) = app.post("/api/navigation/stop", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "not_navigating");
}

#[tokio::test]
async fn test_emergency_contacts_alert_and_call() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;

    let (status, body) = app.get("/api/emergency/contacts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["contacts"][0]["name"], "Emergency Services");
    assert_eq!(body["contacts"][0]["kind"], "emergency");

    let (status, body) = app.post("/api/emergency/alert", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Emergency Alert Sent");
    assert_eq!(body["alert"]["location"], "123 Main Street, Downtown");
    assert_eq!(body["alert"]["recipients"].as_array().unwrap().len(), 3);

    let (status, _) = app
        .send(Method::PUT, "/api/settings/location_sharing/toggle", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.post("/api/emergency/alert", None).await;
    assert!(body["alert"]["location"].is_null());

    let (status, _) = app
        .send(Method::PUT, "/api/settings/emergency_alerts/toggle", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.post("/api/emergency/alert", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "emergency_alerts_disabled");

    let (status, body) = app.post("/api/emergency/contacts/1/call", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dial_uri"], "tel:911");

    let (status, body) = app.post("/api/emergency/contacts/99/call", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "contact_not_found");
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_toggle_persists() {
    let app = TestApp::new().await;
    app.wait_for_flow(Flow::Unauthenticated).await;
    app.sign_up("ada@example.com", "secret123").await;

    let (status, body) = app.get("/api/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dark_mode"], false);
    assert_eq!(body["notifications"], true);

    let (status, body) = app
        .send(Method::PUT, "/api/settings/dark_mode/toggle", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "dark_mode");
    assert_eq!(body["enabled"], true);

    let saved: Value = serde_json::from_str(
        &std::fs::read_to_string(app.dir.path().join("settings.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["dark_mode"], true);

    let (status, body) = app
        .send(Method::PUT, "/api/settings/wifi/toggle", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_setting");

    let (status, body) = app.post("/api/settings/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dark_mode"], false);
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "SoleMate API");
    assert!(body["paths"]["/api/settings/{key}/toggle"].is_object());
}
